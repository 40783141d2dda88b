//! Human-readable identifier allocation

use std::collections::HashSet;

/// Return the lowest `prefix + zero-padded counter` not already taken.
///
/// The counter starts at 1, so gaps left by deletions are reused first.
/// Counters wider than `width` are printed in full.
pub fn next_id<'a, I>(existing: I, prefix: &str, width: usize) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<&str> = existing.into_iter().collect();
    let mut counter: u64 = 1;
    loop {
        let candidate = format!("{prefix}{counter:0width$}");
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_id() {
        assert_eq!(next_id([], "Z", 3), "Z001");
    }

    #[test]
    fn test_lowest_gap_wins() {
        assert_eq!(next_id(["Z001", "Z003"], "Z", 3), "Z002");
    }

    #[test]
    fn test_skips_contiguous_run() {
        assert_eq!(next_id(["P001", "P002", "P003"], "P", 3), "P004");
    }

    #[test]
    fn test_foreign_ids_are_ignored() {
        assert_eq!(next_id(["fixed-cashier", "Z1"], "Z", 3), "Z001");
    }

    #[test]
    fn test_counter_overflows_width() {
        let existing: Vec<String> = (1..=9).map(|n| format!("A{n}")).collect();
        assert_eq!(next_id(existing.iter().map(String::as_str), "A", 1), "A10");
    }
}

//! Bounds validation for zones and placements inside a container
//!
//! All checks here are pure. The order in which reasons are reported is
//! fixed: position, width, height, then overlaps in the order the existing
//! rectangles were supplied.

use thiserror::Error;

use super::types::{Container, Rect};

/// Why a candidate rectangle cannot be committed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictReason {
    #[error("position cannot be negative")]
    NegativePosition,

    #[error("zone exceeds the container width")]
    ExceedsContainerWidth,

    #[error("zone exceeds the container height")]
    ExceedsContainerHeight,

    #[error("overlaps with zone \"{0}\"")]
    OverlapsWith(String),
}

/// Validate a candidate rectangle against a container and already committed rectangles.
///
/// Returns an empty list iff the candidate is legal.
pub fn validate_zone<'a, I>(candidate: &Rect, container: &Container, existing: I) -> Vec<ConflictReason>
where
    I: IntoIterator<Item = (&'a str, &'a Rect)>,
{
    let mut reasons = Vec::new();

    if candidate.x < 0.0 || candidate.y < 0.0 {
        reasons.push(ConflictReason::NegativePosition);
    }
    if candidate.right() > container.width {
        reasons.push(ConflictReason::ExceedsContainerWidth);
    }
    if candidate.bottom() > container.height {
        reasons.push(ConflictReason::ExceedsContainerHeight);
    }

    for (id, rect) in existing {
        if candidate.overlaps_strict(rect) {
            reasons.push(ConflictReason::OverlapsWith(id.to_string()));
        }
    }

    reasons
}

/// Validate an edit of an existing zone: the zone is never compared with itself.
pub fn validate_zone_update<'a, I>(
    zone_id: &str,
    candidate: &Rect,
    container: &Container,
    existing: I,
) -> Vec<ConflictReason>
where
    I: IntoIterator<Item = (&'a str, &'a Rect)>,
{
    validate_zone(
        candidate,
        container,
        existing.into_iter().filter(|(id, _)| *id != zone_id),
    )
}

/// Default suggestion size for a new zone (width, height)
const SUGGESTED_SLOT: (f64, f64) = (20.0, 15.0);

/// Suggested starting rectangles for a new zone in an otherwise empty container:
/// the top-left and top-right corners. Suggestions that would not fit are dropped.
pub fn suggest_free_slots(container: &Container) -> Vec<Rect> {
    let (slot_w, slot_h) = SUGGESTED_SLOT;
    let height = slot_h.min(container.height);

    let candidates = [
        Rect::new(0.0, 0.0, slot_w.min(container.width), height),
        Rect::new(container.width - slot_w, 0.0, slot_w, height),
    ];

    let mut slots: Vec<Rect> = Vec::new();
    for rect in candidates {
        if !rect.has_positive_size() {
            continue;
        }
        if !validate_zone(&rect, container, std::iter::empty()).is_empty() {
            continue;
        }
        if slots.iter().any(|s| s == &rect) {
            continue;
        }
        slots.push(rect);
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn zones<'a>(list: &'a [(&'a str, Rect)]) -> impl Iterator<Item = (&'a str, &'a Rect)> {
        list.iter().map(|(id, r)| (*id, r))
    }

    #[test]
    fn test_legal_zone_has_no_reasons() {
        let container = Container::new(50.0, 30.0);
        let reasons = validate_zone(&Rect::new(0.0, 0.0, 50.0, 30.0), &container, zones(&[]));
        assert!(reasons.is_empty());
    }

    #[test]
    fn test_reason_order_is_fixed() {
        let container = Container::new(10.0, 10.0);
        let existing = [("Z001", Rect::new(0.0, 0.0, 5.0, 5.0))];
        let reasons = validate_zone(
            &Rect::new(-1.0, 2.0, 20.0, 20.0),
            &container,
            zones(&existing),
        );
        assert_eq!(
            reasons,
            vec![
                ConflictReason::NegativePosition,
                ConflictReason::ExceedsContainerWidth,
                ConflictReason::ExceedsContainerHeight,
                ConflictReason::OverlapsWith("Z001".to_string()),
            ]
        );
    }

    #[test]
    fn test_update_skips_self() {
        let container = Container::new(50.0, 30.0);
        let existing = [
            ("Z001", Rect::new(0.0, 0.0, 20.0, 15.0)),
            ("Z002", Rect::new(25.0, 0.0, 20.0, 15.0)),
        ];
        let moved = Rect::new(2.0, 0.0, 20.0, 15.0);
        assert!(validate_zone_update("Z001", &moved, &container, zones(&existing)).is_empty());

        let onto_neighbour = Rect::new(10.0, 0.0, 20.0, 15.0);
        assert_eq!(
            validate_zone_update("Z001", &onto_neighbour, &container, zones(&existing)),
            vec![ConflictReason::OverlapsWith("Z002".to_string())]
        );
    }

    #[test]
    fn test_suggestions_fit_container() {
        let slots = suggest_free_slots(&Container::new(50.0, 30.0));
        assert_eq!(
            slots,
            vec![
                Rect::new(0.0, 0.0, 20.0, 15.0),
                Rect::new(30.0, 0.0, 20.0, 15.0)
            ]
        );
    }

    #[test]
    fn test_suggestions_in_small_container() {
        // The right-hand slot would start at a negative x
        let slots = suggest_free_slots(&Container::new(12.0, 8.0));
        assert_eq!(slots, vec![Rect::new(0.0, 0.0, 12.0, 8.0)]);
    }

    #[test]
    fn test_reason_messages() {
        insta::assert_snapshot!(
            ConflictReason::OverlapsWith("Z004".to_string()).to_string(),
            @r#"overlaps with zone "Z004""#
        );
    }
}

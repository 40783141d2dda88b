//! Element type → color palette
//!
//! Every plan element and placed entity is colored by its type. The built-in
//! palette covers the structural pieces, the furniture slot types and the
//! decorative elements of the 2D editor. A TOML file can override or extend it:
//!
//! ```toml
//! [metadata]
//! name = "High contrast"
//!
//! [colors]
//! shelf = "#000000"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or parsing palettes
#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("Failed to read palette file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse palette TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid color '{value}' for '{token}'")]
    InvalidColor { token: String, value: String },
}

/// Color for any type the palette does not know
pub const FALLBACK_COLOR: &str = "#CCCCCC";

const DEFAULT_COLORS: &[(&str, &str)] = &[
    ("wall", "#555555"),
    ("door", "#8B4513"),
    ("window", "#87CEEB"),
    ("shelf", "#A0522D"),
    ("rack", "#708090"),
    ("display", "#4682B4"),
    ("table", "#CD853F"),
    ("fridge", "#B0C4DE"),
    ("planogram", "#6A5ACD"),
    ("gondola", "#20B2AA"),
    ("line", "#333333"),
    ("rectangle", "#5D8AA8"),
    ("circle", "#6495ED"),
    ("chair", "#8B8970"),
    ("sofa", "#9370DB"),
    ("bed", "#8B008B"),
    ("plant", "#228B22"),
    ("counter", "#D2691E"),
    ("cashier", "#FF7F50"),
    ("mannequin", "#E6E6FA"),
    ("cube", "#5D4037"),
    ("zone", "#E8F4EA"),
    ("furniture", "#A0522D"),
];

#[derive(Debug, Clone)]
pub struct Palette {
    pub name: Option<String>,
    /// Type name → hex color
    pub colors: HashMap<String, String>,
}

#[derive(Deserialize)]
struct TomlPalette {
    metadata: Option<TomlMetadata>,
    #[serde(default)]
    colors: HashMap<String, String>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

impl Palette {
    pub fn from_file(path: &Path) -> Result<Self, PaletteError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a palette; its colors are layered over the built-in ones.
    pub fn from_str(content: &str) -> Result<Self, PaletteError> {
        let parsed: TomlPalette = toml::from_str(content)?;

        let mut palette = Self::default();
        palette.name = parsed.metadata.and_then(|m| m.name);
        for (token, value) in parsed.colors {
            if !is_hex_color(&value) {
                return Err(PaletteError::InvalidColor { token, value });
            }
            palette.colors.insert(token.to_lowercase(), value);
        }
        Ok(palette)
    }

    pub fn resolve(&self, element_type: &str) -> Option<&str> {
        self.colors
            .get(&element_type.to_lowercase())
            .map(String::as_str)
    }

    /// Color for a type, falling back to [`FALLBACK_COLOR`]
    pub fn color_for(&self, element_type: &str) -> &str {
        self.resolve(element_type).unwrap_or(FALLBACK_COLOR)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            name: None,
            colors: DEFAULT_COLORS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette() {
        let palette = Palette::default();
        assert_eq!(palette.resolve("wall"), Some("#555555"));
        assert_eq!(palette.resolve("cashier"), Some("#FF7F50"));
        assert_eq!(palette.color_for("GONDOLA"), "#20B2AA");
    }

    #[test]
    fn test_unknown_type_falls_back() {
        assert_eq!(Palette::default().color_for("spaceship"), "#CCCCCC");
    }

    #[test]
    fn test_parse_toml_overrides_defaults() {
        let toml_str = r##"
[metadata]
name = "Test Theme"

[colors]
shelf = "#000000"
kiosk = "#123"
"##;
        let palette = Palette::from_str(toml_str).expect("Should parse");
        assert_eq!(palette.name, Some("Test Theme".to_string()));
        assert_eq!(palette.resolve("shelf"), Some("#000000"));
        assert_eq!(palette.resolve("kiosk"), Some("#123"));
        assert_eq!(palette.resolve("wall"), Some("#555555"));
    }

    #[test]
    fn test_invalid_color() {
        let result = Palette::from_str("[colors]\nshelf = \"brown\"\n");
        assert!(matches!(result, Err(PaletteError::InvalidColor { .. })));
    }

    #[test]
    fn test_invalid_toml_error() {
        assert!(Palette::from_str("this is not valid toml {{{{").is_err());
    }
}

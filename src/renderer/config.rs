//! Configuration for SVG rendering

/// Configuration options for the top-down SVG view
#[derive(Debug, Clone)]
pub struct SvgConfig {
    /// Drawing units per world meter
    pub pixels_per_meter: f64,

    /// Padding around the viewBox, in drawing units
    pub viewbox_padding: f64,

    /// Whether to include the XML declaration
    pub standalone: bool,

    /// Whether to format output with indentation
    pub pretty_print: bool,

    /// Draw the anchored floor plan under the placed entities
    pub show_plan: bool,

    /// Prefix for CSS class names (e.g., "sl-" for "sl-zone")
    pub class_prefix: Option<String>,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            viewbox_padding: 20.0,
            standalone: true,
            pretty_print: true,
            show_plan: true,
            class_prefix: Some("sl-".to_string()),
        }
    }
}

impl SvgConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pixels_per_meter(mut self, scale: f64) -> Self {
        self.pixels_per_meter = scale;
        self
    }

    /// Set the viewBox padding
    pub fn with_viewbox_padding(mut self, padding: f64) -> Self {
        self.viewbox_padding = padding;
        self
    }

    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Toggle the plan overlay
    pub fn with_plan(mut self, show: bool) -> Self {
        self.show_plan = show;
        self
    }

    /// Set the CSS class prefix
    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = Some(prefix.into());
        self
    }

    pub fn without_class_prefix(mut self) -> Self {
        self.class_prefix = None;
        self
    }
}

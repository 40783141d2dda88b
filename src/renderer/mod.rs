//! SVG rendering of a layout session

pub mod config;
pub mod svg;

pub use config::SvgConfig;
pub use svg::{render_svg, SvgBuilder};

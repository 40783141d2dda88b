//! Store Layout - spatial layout and scene synchronization for retail floors
//!
//! The crate keeps a 2D authoring view (zones on a store floor, an authored
//! floor plan) and a 3D scene graph in step. Every change goes through a
//! [`Session`]: zones are validated against the container and each other,
//! catalog templates are matched one-to-one with plan elements, and placed
//! entities are mirrored as scene nodes.
//!
//! # Example
//!
//! ```rust
//! use store_layout::{replay, Catalog, EngineConfig};
//!
//! let script = "container 20 10\nzone [width: 4, height: 3, name: \"Entrée\"]";
//! let (session, report) = replay(script, EngineConfig::default(), Catalog::new()).unwrap();
//! assert!(report.is_clean());
//! assert_eq!(session.zones().zones()[0].zone_id, "Z001");
//! ```

pub mod config;
pub mod entity;
pub mod geometry;
pub mod ids;
pub mod lint;
pub mod matcher;
pub mod palette;
pub mod plan;
pub mod renderer;
pub mod scene;
pub mod script;
pub mod session;
pub mod zone;

pub use config::{ConfigError, EngineConfig};
pub use entity::{EntityKind, PlacedEntity};
pub use geometry::{ConflictReason, Container, Dimensions, Point, Point3, Rect, Viewport};
pub use lint::{LintCategory, LintWarning};
pub use matcher::{Assignment, MatchError, Matcher};
pub use palette::{Palette, PaletteError};
pub use plan::{Catalog, FloorPlan, PlaceableTemplate, PlanElement, PlanError, PlanLibrary};
pub use renderer::{render_svg, SvgConfig};
pub use scene::{Camera, SceneError, SceneSynchronizer, SyncStrategy};
pub use script::{RunReport, ScriptError};
pub use session::{MatchState, Session, SessionError};
pub use zone::{Orientation, Zone, ZoneLayout};

/// Build a session and replay a script against it.
///
/// Syntax errors are returned before anything runs; command failures are
/// recorded in the [`RunReport`].
pub fn replay(
    source: &str,
    config: EngineConfig,
    catalog: Catalog,
) -> Result<(Session, RunReport), Vec<ScriptError>> {
    let script = script::parse(source)?;
    let mut session = Session::new(config, catalog);
    let report = script::execute(&mut session, &script, source);
    Ok((session, report))
}

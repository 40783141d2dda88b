//! The 3D scene: node arena, synchronizer and camera

pub mod camera;
pub mod node;
pub mod sync;

pub use camera::{Camera, CameraSettings, Framing, PanDirection};
pub use node::{MeshPart, NodeBlueprint, SceneNode};
pub use sync::{NodeKey, SceneError, SceneSynchronizer, SyncStats, SyncStrategy, PREVIEW_ID};

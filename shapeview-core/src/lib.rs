/// Shapeview Core Library - Shape catalog and 3D scene logic
///
/// This library holds everything that does not touch a concrete terminal or
/// browser: the shape records and their persistence, the catalog store, the
/// creation form and table view models, and the interactive scene with its
/// geometry, camera and ray casting.

pub mod catalog;
pub mod error;
pub mod form;
pub mod geometry;
pub mod projection;
pub mod raycast;
pub mod scene;
pub mod shape;
pub mod storage;
pub mod table;
pub mod transform;
pub mod viewer;

// Re-export commonly used types
pub use catalog::{Catalog, Snapshot, SubscriptionId};
pub use error::StoreError;
pub use form::{Field, FormErrors, ShapeForm};
pub use geometry::{Mesh, Primitive, Triangle, Vertex};
pub use projection::{Camera, OrbitControls, ProjectionMode, Viewport};
pub use raycast::Ray;
pub use scene::{ColorSource, Interaction, MeshId, Rgb, Scene, SceneObject};
pub use shape::{ShapeDraft, ShapeId, ShapeKind, ShapeRecord};
pub use storage::{FileStore, KeyValueStore, MemoryStore, ShapeRepository};
pub use table::{RenderRequest, TableLayout, TableRow, TableView};
pub use transform::{ObjectTransform, Transform};
pub use viewer::{FrameLoop, InputListeners, Listener, Viewer};

#[cfg(feature = "rand")]
pub use scene::RandomColors;

pub mod config;
pub mod connections;
pub mod error;
pub mod geometry;
pub mod id;
pub mod model;
pub mod shapes;

pub use config::EditorConfig;
pub use connections::ConnectionStore;
pub use error::EditorError;
pub use geometry::ConnectionPath;
pub use id::{ConnectionId, IdGenerator, SequentialIds, ShapeId};
pub use model::*;
pub use shapes::{Placement, ShapeStore};

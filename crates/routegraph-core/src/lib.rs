pub mod edge;
pub mod error;
pub mod id;
pub mod snapshot;

// Re-export commonly used types
pub use edge::{Directedness, EdgeAttrs};
pub use error::CoreError;
pub use id::{EdgeId, NodeId, Timestamp};
pub use snapshot::{OutEdge, Snapshot, SnapshotBuilder, SnapshotSource};

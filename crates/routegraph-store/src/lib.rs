//! Mutable stores for routing graphs.
//!
//! Provides the current-state [`GraphStore`], the timestamped
//! [`TemporalIndex`] and the lock-guarded [`SharedGraphStore`]. Every store
//! hands out immutable [`Snapshot`](routegraph_core::Snapshot)s; the query
//! engine only ever reads those.
//!
//! # Modules
//!
//! - [`graph`]: GraphStore over a petgraph `StableGraph`
//! - [`temporal`]: per-edge timestamped history with "as of" lookups
//! - [`shared`]: `RwLock`-guarded store with per-generation snapshot cache

pub mod graph;
pub mod shared;
pub mod temporal;

// Re-export key types for ergonomic use.
pub use graph::GraphStore;
pub use shared::SharedGraphStore;
pub use temporal::{EdgeHistory, EdgeVersion, TemporalIndex, TemporalView};

//! Path queries over immutable graph snapshots.
//!
//! Queries pick an [`Objective`] (minimum total weight, maximum bottleneck
//! capacity or maximum reliability product) and optional [`Constraints`].
//! Results are deterministic: among equally good routes the one with fewer
//! hops wins, then the lexicographically smaller node sequence.
//!
//! "Equally good" means bitwise-equal `f64` scores. Weight sums and
//! reliability products of values that binary floating point cannot hold
//! exactly (`0.1`, `0.3`, ...) pick up rounding that depends on the order of
//! the terms, so two routes that are equal on paper may compare unequal and
//! skip the hop and node-order tie-breaks. Integer weights and dyadic
//! reliabilities (`0.5`, `0.25`, ...) compare exactly.
//!
//! A missing route is a normal outcome, reported as `None`, an empty path or
//! the objective's sentinel cost. Errors are reserved for malformed queries.
//!
//! ```
//! use routegraph_core::{EdgeAttrs, EdgeId, NodeId, SnapshotBuilder};
//! use routegraph_query::{find_path, find_path_cost, Objective, RouteQuery};
//!
//! let mut builder = SnapshotBuilder::new(3).unwrap();
//! builder.push_link(NodeId(0), NodeId(1), EdgeId(0), EdgeAttrs::new(2.0), false).unwrap();
//! builder.push_link(NodeId(1), NodeId(2), EdgeId(1), EdgeAttrs::new(3.0), false).unwrap();
//! let snapshot = builder.build();
//!
//! let query = RouteQuery::new(NodeId(0), NodeId(2));
//! assert_eq!(find_path(&snapshot, &query).unwrap(), vec![NodeId(0), NodeId(1), NodeId(2)]);
//! assert_eq!(find_path_cost(&snapshot, &query).unwrap(), 5.0);
//!
//! let widest = query.with_objective(Objective::Capacity);
//! assert_eq!(find_path_cost(&snapshot, &widest).unwrap(), f64::INFINITY);
//! ```

pub mod constraints;
pub mod engine;
pub mod error;
pub mod objective;
pub mod route;
pub mod verify;

mod constrained;
mod search;
mod widest;

pub use constraints::Constraints;
pub use engine::{Engine, Resolution, SearchConfig};
pub use error::QueryError;
pub use objective::Objective;
pub use route::{Route, RouteQuery};

use routegraph_core::{NodeId, Snapshot};

/// Best route under the default [`SearchConfig`].
pub fn find_route(snapshot: &Snapshot, query: &RouteQuery) -> Result<Option<Route>, QueryError> {
    Engine::default().route(snapshot, query)
}

/// Node sequence of the best route; empty when none exists.
pub fn find_path(snapshot: &Snapshot, query: &RouteQuery) -> Result<Vec<NodeId>, QueryError> {
    Engine::default().path(snapshot, query)
}

/// Score of the best route, or [`Objective::unreachable_sentinel`].
pub fn find_path_cost(snapshot: &Snapshot, query: &RouteQuery) -> Result<f64, QueryError> {
    Engine::default().cost(snapshot, query)
}

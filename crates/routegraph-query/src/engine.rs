//! Query dispatch.
//!
//! [`Engine`] validates a [`RouteQuery`] against a snapshot and picks the
//! search that answers it:
//!
//! - `Capacity` objective: [`widest`](crate::widest) two-phase routing
//! - cumulative bound the objective does not settle: multi-resource label
//!   search
//! - otherwise: single-label search, with objective-implied bounds (a weight
//!   budget on a weight query) checked on the result
//!
//! The engine holds no graph state. It only reads the snapshot it is handed,
//! so one engine can serve any number of threads.

use serde::{Deserialize, Serialize};

use routegraph_core::{NodeId, Snapshot, SnapshotSource};

use crate::constrained::{constrained_path, Budget};
use crate::error::QueryError;
use crate::objective::{Metric, Objective};
use crate::route::{Path, Route, RouteQuery};
use crate::search::{best_path, EdgeFilter};
use crate::widest::widest_path;

/// How the multi-resource search bounds its per-node label sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// One Pareto frontier per node, capped by `max_labels`.
    Exact,
    /// Label table keyed by node and resource bucket vector, `n` buckets per
    /// bounded resource, with dominance checked inside each bucket.
    Buckets(u32),
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::Buckets(64)
    }
}

/// Tuning for constrained searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub resolution: Resolution,
    /// Upper bound on labels created by one constrained search.
    #[serde(default = "default_max_labels")]
    pub max_labels: usize,
}

fn default_max_labels() -> usize {
    1 << 20
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            resolution: Resolution::default(),
            max_labels: default_max_labels(),
        }
    }
}

impl SearchConfig {
    pub fn exact() -> Self {
        SearchConfig {
            resolution: Resolution::Exact,
            ..SearchConfig::default()
        }
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.resolution == Resolution::Buckets(0) {
            return Err(QueryError::invalid_constraint("bucket count must be >= 1"));
        }
        if self.max_labels == 0 {
            return Err(QueryError::invalid_constraint("max_labels must be >= 1"));
        }
        Ok(())
    }
}

/// Stateless route planner over immutable snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    config: SearchConfig,
}

impl Engine {
    pub fn new() -> Self {
        Engine::default()
    }

    pub fn with_config(config: SearchConfig) -> Self {
        Engine { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Best route for `query`, or `Ok(None)` when no route satisfies it.
    pub fn route(&self, snapshot: &Snapshot, query: &RouteQuery) -> Result<Option<Route>, QueryError> {
        snapshot.check_node(query.source)?;
        snapshot.check_node(query.destination)?;
        query.constraints.validate()?;
        self.config.validate()?;

        let route = if query.source == query.destination {
            Some(Route::trivial(query.source, query.objective))
        } else if !snapshot.is_available(query.source) {
            None
        } else {
            self.search(snapshot, query)?
                .map(|path| Route::from_path(path, query.objective))
        };
        let route = route.filter(|r| query.constraints.admits(r));

        tracing::debug!(
            source = %query.source,
            destination = %query.destination,
            objective = %query.objective,
            hops = route.as_ref().map(|r| r.hops),
            "route query"
        );
        Ok(route)
    }

    /// Takes a snapshot of `source` and routes against it.
    pub fn route_from(
        &self,
        source: &impl SnapshotSource,
        query: &RouteQuery,
    ) -> Result<Option<Route>, QueryError> {
        self.route(&source.snapshot(), query)
    }

    /// Node sequence of the best route; empty when there is none.
    pub fn path(&self, snapshot: &Snapshot, query: &RouteQuery) -> Result<Vec<NodeId>, QueryError> {
        Ok(self.route(snapshot, query)?.map(|r| r.nodes).unwrap_or_default())
    }

    /// Objective score of the best route, or the objective's no-path
    /// sentinel.
    pub fn cost(&self, snapshot: &Snapshot, query: &RouteQuery) -> Result<f64, QueryError> {
        Ok(self
            .route(snapshot, query)?
            .map_or(query.objective.unreachable_sentinel(), |r| r.score))
    }

    /// Answers a batch of queries against one snapshot. Results are in query
    /// order. With the `parallel` feature the batch is spread over the rayon
    /// thread pool.
    pub fn route_many(
        &self,
        snapshot: &Snapshot,
        queries: &[RouteQuery],
    ) -> Vec<Result<Option<Route>, QueryError>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            queries.par_iter().map(|q| self.route(snapshot, q)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            queries.iter().map(|q| self.route(snapshot, q)).collect()
        }
    }

    fn search(
        &self,
        snapshot: &Snapshot,
        query: &RouteQuery,
    ) -> Result<Option<Path>, QueryError> {
        let constraints = &query.constraints;
        if query.objective == Objective::Capacity {
            return widest_path(snapshot, query.source, query.destination, constraints, self.config);
        }

        let metric = Metric::from(query.objective);
        let filter = EdgeFilter::min_capacity(constraints.min_capacity);
        if constraints.needs_resource_search(query.objective) {
            constrained_path(
                snapshot,
                query.source,
                query.destination,
                metric,
                filter,
                Budget::new(constraints, metric),
                self.config,
            )
        } else {
            Ok(best_path(snapshot, query.source, query.destination, metric, filter))
        }
    }
}

//! Route queries and their results.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use routegraph_core::{EdgeAttrs, NodeId};

use crate::constraints::Constraints;
use crate::objective::Objective;

/// A single routing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteQuery {
    pub source: NodeId,
    pub destination: NodeId,
    #[serde(default)]
    pub objective: Objective,
    #[serde(default)]
    pub constraints: Constraints,
}

impl RouteQuery {
    /// Minimum-weight query with no constraints.
    pub fn new(source: NodeId, destination: NodeId) -> Self {
        RouteQuery {
            source,
            destination,
            objective: Objective::default(),
            constraints: Constraints::default(),
        }
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
}

/// A found route with its per-attribute totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// Node sequence from source to destination, both included.
    pub nodes: Vec<NodeId>,
    pub objective: Objective,
    /// The objective's score for this route.
    pub score: f64,
    pub weight: f64,
    pub toll: f64,
    /// Smallest edge capacity; `None` when every edge is unlimited.
    pub bottleneck: Option<f64>,
    pub reliability: f64,
    pub hops: u32,
}

impl Route {
    /// The zero-edge route `[node]`.
    pub fn trivial(node: NodeId, objective: Objective) -> Self {
        Route {
            nodes: vec![node],
            objective,
            score: objective.origin(),
            weight: 0.0,
            toll: 0.0,
            bottleneck: None,
            reliability: 1.0,
            hops: 0,
        }
    }

    /// Folds the totals of a path, edge by edge from the source.
    pub(crate) fn from_path(path: Path, objective: Objective) -> Self {
        let mut route = Route::trivial(path.nodes[0], objective);
        for attrs in &path.edges {
            route.score = objective.extend(route.score, attrs);
            route.weight += attrs.weight;
            route.toll += attrs.toll;
            route.reliability *= attrs.reliability;
            if let Some(capacity) = attrs.capacity {
                route.bottleneck = Some(route.bottleneck.map_or(capacity, |b| b.min(capacity)));
            }
            route.hops += 1;
        }
        route.nodes = path.nodes;
        route
    }

    /// Total order used to pick among routes: objective score, then fewer
    /// hops, then the lexicographically smaller node sequence.
    pub fn preference_cmp(&self, other: &Route) -> Ordering {
        self.objective
            .compare(self.score, other.score)
            .then(self.hops.cmp(&other.hops))
            .then_with(|| self.nodes.cmp(&other.nodes))
    }
}

/// A path as the searches produce it: nodes plus the attributes of the
/// edge taken between each consecutive pair.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Path {
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) edges: Vec<EdgeAttrs>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_accumulates_totals() {
        let path = Path {
            nodes: vec![NodeId(0), NodeId(1), NodeId(2)],
            edges: vec![
                EdgeAttrs::new(2.0).with_capacity(80.0).with_toll(1.0),
                EdgeAttrs::new(3.0).with_reliability(0.5),
            ],
        };
        let route = Route::from_path(path, Objective::Weight);
        assert_eq!(route.score, 5.0);
        assert_eq!(route.weight, 5.0);
        assert_eq!(route.toll, 1.0);
        assert_eq!(route.bottleneck, Some(80.0));
        assert_eq!(route.reliability, 0.5);
        assert_eq!(route.hops, 2);
        assert_eq!(route.nodes.last(), Some(&NodeId(2)));
    }

    #[test]
    fn unlimited_route_has_infinite_capacity_score() {
        let path = Path {
            nodes: vec![NodeId(0), NodeId(1)],
            edges: vec![EdgeAttrs::new(1.0)],
        };
        let route = Route::from_path(path, Objective::Capacity);
        assert_eq!(route.bottleneck, None);
        assert_eq!(route.score, f64::INFINITY);
    }

    #[test]
    fn query_deserializes_with_defaults() {
        let q: RouteQuery = serde_json::from_str(r#"{"source":0,"destination":2}"#).unwrap();
        assert_eq!(q, RouteQuery::new(NodeId(0), NodeId(2)));

        let q: RouteQuery = serde_json::from_str(
            r#"{"source":1,"destination":3,"objective":"capacity","constraints":{"max_hops":2}}"#,
        )
        .unwrap();
        assert_eq!(q.objective, Objective::Capacity);
        assert_eq!(q.constraints, Constraints::none().with_max_hops(2));
    }

    #[test]
    fn preference_breaks_ties_by_hops_then_nodes() {
        let mut a = Route::trivial(NodeId(0), Objective::Weight);
        a.nodes = vec![NodeId(0), NodeId(1), NodeId(3)];
        a.hops = 2;
        a.score = 4.0;
        let mut b = a.clone();
        b.nodes = vec![NodeId(0), NodeId(2), NodeId(3)];
        assert_eq!(a.preference_cmp(&b), Ordering::Less);

        let mut c = a.clone();
        c.nodes = vec![NodeId(0), NodeId(3)];
        c.hops = 1;
        assert_eq!(c.preference_cmp(&a), Ordering::Less);
    }
}

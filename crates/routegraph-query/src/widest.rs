//! Maximum-bottleneck routing.
//!
//! Bottleneck scores are not strictly monotone: appending an edge wider than
//! the current bottleneck leaves the score unchanged, so the single-label
//! search alone cannot also guarantee the fewest-hops, lexicographic tie
//! break. Routing therefore runs in two phases:
//!
//! 1. find the best achievable bottleneck `B*`
//! 2. among edges with capacity `>= B*`, find the fewest-hops,
//!    lexicographically smallest path
//!
//! With cumulative constraints, phase 1 becomes a binary search over the
//! distinct capacities in the snapshot: the feasible thresholds form a
//! prefix of the descending capacity list, and the largest feasible one is
//! `B*`.

use routegraph_core::{NodeId, Snapshot};

use crate::constrained::{constrained_path, Budget};
use crate::constraints::Constraints;
use crate::engine::SearchConfig;
use crate::error::QueryError;
use crate::objective::{Metric, Objective};
use crate::route::Path;
use crate::search::{best_path, EdgeFilter};

pub(crate) fn widest_path(
    snapshot: &Snapshot,
    source: NodeId,
    destination: NodeId,
    constraints: &Constraints,
    config: SearchConfig,
) -> Result<Option<Path>, QueryError> {
    let filter = EdgeFilter::min_capacity(constraints.min_capacity);

    if !constraints.needs_resource_search(Objective::Capacity) {
        let Some(widest) = best_path(snapshot, source, destination, Metric::Capacity, filter)
        else {
            return Ok(None);
        };
        let bottleneck = widest
            .edges
            .iter()
            .fold(f64::INFINITY, |b, e| b.min(e.capacity_or_unlimited()));
        tracing::trace!(bottleneck, "widest bottleneck found");
        let narrowed = EdgeFilter::min_capacity(Some(bottleneck));
        return Ok(best_path(snapshot, source, destination, Metric::Hops, narrowed));
    }

    let thresholds = capacity_thresholds(snapshot, &filter);
    let budget = Budget::new(constraints, Metric::Hops);
    let mut lo = 0;
    let mut hi = thresholds.len();
    let mut best = None;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let narrowed = EdgeFilter::min_capacity(Some(thresholds[mid]));
        match constrained_path(snapshot, source, destination, Metric::Hops, narrowed, budget, config)? {
            Some(path) => {
                best = Some(path);
                hi = mid;
            }
            None => lo = mid + 1,
        }
    }
    tracing::trace!(
        thresholds = thresholds.len(),
        feasible = best.is_some(),
        "bottleneck threshold search finished"
    );
    // The last feasible threshold tried is the one at the final `hi`, which is `lo`.
    Ok(best)
}

/// Distinct capacities of admissible edges, widest first.
fn capacity_thresholds(snapshot: &Snapshot, filter: &EdgeFilter) -> Vec<f64> {
    let mut thresholds: Vec<f64> = snapshot
        .iter_edges()
        .filter(|(_, e)| filter.admits(&e.attrs))
        .map(|(_, e)| e.attrs.capacity_or_unlimited())
        .collect();
    thresholds.sort_by(|a, b| b.total_cmp(a));
    thresholds.dedup();
    thresholds
}

#[cfg(test)]
mod tests {
    use super::*;
    use routegraph_core::{EdgeAttrs, EdgeId, SnapshotBuilder};

    fn graph(n: usize, edges: &[(u32, u32, EdgeAttrs)]) -> Snapshot {
        let mut builder = SnapshotBuilder::new(n).unwrap();
        for (i, (u, v, attrs)) in edges.iter().enumerate() {
            builder
                .push_link(NodeId(*u), NodeId(*v), EdgeId(i as u32), *attrs, true)
                .unwrap();
        }
        builder.build()
    }

    fn ids(path: Option<Path>) -> Option<Vec<u32>> {
        path.map(|p| p.nodes.iter().map(|n| n.0).collect())
    }

    /// A-B-C with capacities 100 and 50, and a direct A-C at 30.
    fn bottleneck_graph() -> Snapshot {
        graph(
            3,
            &[
                (0, 1, EdgeAttrs::new(1.0).with_capacity(100.0)),
                (1, 2, EdgeAttrs::new(1.0).with_capacity(50.0)),
                (0, 2, EdgeAttrs::new(1.0).with_capacity(30.0)),
            ],
        )
    }

    #[test]
    fn widest_route_beats_shorter_thin_route() {
        let snap = bottleneck_graph();
        let path = widest_path(
            &snap,
            NodeId(0),
            NodeId(2),
            &Constraints::none(),
            SearchConfig::default(),
        )
        .unwrap();
        assert_eq!(ids(path), Some(vec![0, 1, 2]));
    }

    #[test]
    fn hop_limit_falls_back_to_narrower_route() {
        let snap = bottleneck_graph();
        let path = widest_path(
            &snap,
            NodeId(0),
            NodeId(2),
            &Constraints::none().with_max_hops(1),
            SearchConfig::default(),
        )
        .unwrap();
        assert_eq!(ids(path), Some(vec![0, 2]));
    }

    #[test]
    fn equal_bottleneck_prefers_fewer_hops() {
        let snap = graph(
            3,
            &[
                (0, 1, EdgeAttrs::new(1.0).with_capacity(50.0)),
                (1, 2, EdgeAttrs::new(1.0).with_capacity(90.0)),
                (0, 2, EdgeAttrs::new(9.0).with_capacity(50.0)),
            ],
        );
        let path = widest_path(
            &snap,
            NodeId(0),
            NodeId(2),
            &Constraints::none(),
            SearchConfig::default(),
        )
        .unwrap();
        assert_eq!(ids(path), Some(vec![0, 2]));
    }

    #[test]
    fn thresholds_are_distinct_and_descending() {
        let snap = bottleneck_graph();
        let filter = EdgeFilter::min_capacity(Some(40.0));
        assert_eq!(capacity_thresholds(&snap, &filter), vec![100.0, 50.0]);
    }
}

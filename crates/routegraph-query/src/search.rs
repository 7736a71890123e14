//! Single-label search: generalized Dijkstra over one [`Metric`].
//!
//! Every node keeps one label `(score, hops, predecessor)`. Labels are
//! settled in key order, so the first time the destination is popped its
//! label is optimal. Ties are resolved at relaxation time:
//!
//! 1. better score
//! 2. fewer hops
//! 3. lexicographically smaller node sequence
//! 4. for parallel edges out of the same predecessor, the edge preferred by
//!    [`EdgeAttrs::secondary_cmp`], then the lower edge id
//!
//! Because both competing predecessors are already settled when the tie is
//! decided, their node sequences are final and can be compared directly.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use routegraph_core::{EdgeAttrs, NodeId, Snapshot};

use crate::objective::Metric;
use crate::route::Path;

/// Per-edge admission rule shared by every search.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EdgeFilter {
    pub(crate) min_capacity: Option<f64>,
}

impl EdgeFilter {
    pub(crate) fn min_capacity(min_capacity: Option<f64>) -> Self {
        EdgeFilter { min_capacity }
    }

    pub(crate) fn admits(&self, attrs: &EdgeAttrs) -> bool {
        self.min_capacity
            .map_or(true, |bound| attrs.capacity_or_unlimited() >= bound)
    }
}

#[derive(Debug, Clone, Copy)]
struct Label {
    score: f64,
    hops: u32,
    /// Predecessor node and the slot of the edge in its out-edge list.
    pred: Option<(NodeId, usize)>,
}

/// Heap entry ordered so that `BinaryHeap` pops the smallest key first.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frontier<T> {
    pub(crate) key: f64,
    pub(crate) hops: u32,
    pub(crate) item: T,
}

impl<T: Ord> PartialEq for Frontier<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Ord> Eq for Frontier<T> {}

impl<T: Ord> PartialOrd for Frontier<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for Frontier<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.hops.cmp(&self.hops))
            .then_with(|| other.item.cmp(&self.item))
    }
}

/// Best path from `source` to `destination` under `metric`, entering only
/// available nodes and edges admitted by `filter`.
///
/// The caller handles an unavailable source. `source == destination` yields
/// the single-node path.
pub(crate) fn best_path(
    snapshot: &Snapshot,
    source: NodeId,
    destination: NodeId,
    metric: Metric,
    filter: EdgeFilter,
) -> Option<Path> {
    let n = snapshot.node_count();
    let mut labels: Vec<Option<Label>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();

    labels[source.index()] = Some(Label {
        score: metric.origin(),
        hops: 0,
        pred: None,
    });
    heap.push(Frontier {
        key: metric.key(metric.origin()),
        hops: 0,
        item: source,
    });

    let mut explored = 0usize;
    while let Some(Frontier { item: u, .. }) = heap.pop() {
        if settled[u.index()] {
            continue;
        }
        settled[u.index()] = true;
        explored += 1;

        let Some(label) = labels[u.index()] else {
            continue;
        };
        if u == destination {
            tracing::trace!(?metric, explored, "destination settled");
            return Some(reconstruct(snapshot, &labels, destination));
        }

        for (slot, edge) in snapshot.out_edges(u).iter().enumerate() {
            let v = edge.to;
            if settled[v.index()] || !snapshot.is_available(v) || !filter.admits(&edge.attrs) {
                continue;
            }
            let candidate = Label {
                score: metric.extend(label.score, &edge.attrs),
                hops: label.hops + 1,
                pred: Some((u, slot)),
            };
            let replace = match &labels[v.index()] {
                None => true,
                Some(current) => {
                    prefer(snapshot, &labels, metric, &candidate, current) == Ordering::Less
                }
            };
            if replace {
                labels[v.index()] = Some(candidate);
                heap.push(Frontier {
                    key: metric.key(candidate.score),
                    hops: candidate.hops,
                    item: v,
                });
            }
        }
    }

    tracing::trace!(?metric, explored, "destination unreachable");
    None
}

/// Orders two labels competing for the same node. Both predecessors must be
/// settled.
fn prefer(
    snapshot: &Snapshot,
    labels: &[Option<Label>],
    metric: Metric,
    candidate: &Label,
    current: &Label,
) -> Ordering {
    metric
        .compare(candidate.score, current.score)
        .then(candidate.hops.cmp(&current.hops))
        .then_with(|| match (candidate.pred, current.pred) {
            (Some((cp, cslot)), Some((kp, kslot))) if cp == kp => {
                let edges = snapshot.out_edges(cp);
                edges[cslot]
                    .attrs
                    .secondary_cmp(&edges[kslot].attrs)
                    .then(edges[cslot].edge.cmp(&edges[kslot].edge))
            }
            (Some((cp, _)), Some((kp, _))) => node_sequence(labels, cp).cmp(&node_sequence(labels, kp)),
            // The source label never competes with a relaxed label: its
            // score is the origin and it is settled first.
            _ => Ordering::Equal,
        })
}

fn node_sequence(labels: &[Option<Label>], node: NodeId) -> Vec<NodeId> {
    let mut nodes = vec![node];
    let mut current = node;
    while let Some((pred, _)) = labels[current.index()].and_then(|l| l.pred) {
        nodes.push(pred);
        current = pred;
    }
    nodes.reverse();
    nodes
}

fn reconstruct(snapshot: &Snapshot, labels: &[Option<Label>], destination: NodeId) -> Path {
    let mut nodes = vec![destination];
    let mut edges = Vec::new();
    let mut current = destination;
    while let Some((pred, slot)) = labels[current.index()].and_then(|l| l.pred) {
        edges.push(snapshot.out_edges(pred)[slot].attrs);
        nodes.push(pred);
        current = pred;
    }
    nodes.reverse();
    edges.reverse();
    Path { nodes, edges }
}

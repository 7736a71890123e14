//! Multi-resource label search for cumulative constraints.
//!
//! A node can hold many labels here: one path may be worse on the objective
//! but the only one that fits the toll budget. Each label carries the
//! resources spent so far (weight, toll, reliability, hops) and labels are
//! expanded in `(score, hops)` order, pruned as soon as a bound is broken.
//! Paths are kept simple by walking the predecessor chain before extending.
//!
//! Two ways of keeping the per-node label sets small:
//!
//! - [`Resolution::Exact`]: a Pareto frontier. A label survives unless another
//!   label at the node is at least as good on the objective order and spends
//!   no more of every bounded resource. Exact but exponential in the worst
//!   case, so the label count is capped by `max_labels`.
//! - [`Resolution::Buckets`]: every bounded resource is scaled to
//!   `[0, budget]` and cut into `n` buckets, and the label table is keyed by
//!   node and bucket vector. Dominance is only checked inside a bucket, so a
//!   bucket holds a handful of labels that trade objective against spending.
//!   A label is never dropped for one that spends more, so no feasible route
//!   is lost.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use smallvec::SmallVec;

use routegraph_core::{EdgeAttrs, NodeId, Snapshot};

use crate::constraints::Constraints;
use crate::engine::{Resolution, SearchConfig};
use crate::error::QueryError;
use crate::objective::Metric;
use crate::route::Path;
use crate::search::{EdgeFilter, Frontier};

/// Cumulative bounds enforced while searching.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    metric: Metric,
    max_weight: Option<f64>,
    max_toll: Option<f64>,
    min_reliability: Option<f64>,
    max_hops: Option<u32>,
}

impl Budget {
    pub(crate) fn new(constraints: &Constraints, metric: Metric) -> Self {
        Budget {
            metric,
            max_weight: constraints.max_weight,
            max_toll: constraints.max_toll,
            min_reliability: constraints.min_reliability,
            max_hops: constraints.max_hops,
        }
    }

    fn admits(&self, label: &Label) -> bool {
        self.max_weight.map_or(true, |b| label.weight <= b)
            && self.max_toll.map_or(true, |b| label.toll <= b)
            && self.min_reliability.map_or(true, |b| label.reliability >= b)
            && self.max_hops.map_or(true, |b| label.hops <= b)
    }

    /// Weight bound that the objective order does not already cover.
    fn weight_dimension(&self) -> Option<f64> {
        self.max_weight.filter(|_| self.metric != Metric::Weight)
    }

    fn reliability_dimension(&self) -> Option<f64> {
        self.min_reliability
            .filter(|_| self.metric != Metric::Reliability)
    }

    /// Whether `a` spends no more of any bounded resource than `b`.
    fn spends_no_more(&self, a: &Label, b: &Label) -> bool {
        self.weight_dimension().map_or(true, |_| a.weight <= b.weight)
            && self.max_toll.map_or(true, |_| a.toll <= b.toll)
            && self
                .reliability_dimension()
                .map_or(true, |_| a.reliability >= b.reliability)
            && self.max_hops.map_or(true, |_| a.hops <= b.hops)
    }

    fn buckets(&self, label: &Label, n: u32) -> SmallVec<[u32; 4]> {
        let scale = |fraction: f64| -> u32 {
            if fraction > 0.0 {
                ((fraction * f64::from(n)) as u32).min(n - 1)
            } else {
                0
            }
        };
        let mut vector = SmallVec::new();
        if let Some(bound) = self.weight_dimension() {
            vector.push(scale(label.weight / bound));
        }
        if let Some(bound) = self.max_toll {
            vector.push(scale(label.toll / bound));
        }
        if let Some(bound) = self.reliability_dimension() {
            vector.push(scale(label.reliability.ln() / bound.ln()));
        }
        if let Some(bound) = self.max_hops {
            vector.push(scale(f64::from(label.hops) / f64::from(bound)));
        }
        vector
    }
}

#[derive(Debug, Clone, Copy)]
struct Label {
    node: NodeId,
    score: f64,
    hops: u32,
    weight: f64,
    toll: f64,
    reliability: f64,
    /// Predecessor label and the slot of the edge in its node's out-edges.
    pred: Option<(usize, usize)>,
}

impl Label {
    fn extend(&self, id: usize, slot: usize, to: NodeId, attrs: &EdgeAttrs, metric: Metric) -> Self {
        Label {
            node: to,
            score: metric.extend(self.score, attrs),
            hops: self.hops + 1,
            weight: self.weight + attrs.weight,
            toll: self.toll + attrs.toll,
            reliability: self.reliability * attrs.reliability,
            pred: Some((id, slot)),
        }
    }

    /// Resource tuple used to break ties between labels with identical node
    /// sequences (parallel edges).
    fn resource_cmp(&self, other: &Label) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then(self.toll.total_cmp(&other.toll))
            .then(other.reliability.total_cmp(&self.reliability))
    }
}

struct LabelSearch<'a> {
    snapshot: &'a Snapshot,
    metric: Metric,
    budget: Budget,
    config: SearchConfig,
    labels: Vec<Label>,
    alive: Vec<bool>,
    heap: BinaryHeap<Frontier<usize>>,
    pareto: Vec<Vec<usize>>,
    buckets: HashMap<(NodeId, SmallVec<[u32; 4]>), Vec<usize>>,
}

/// Best simple path from `source` to `destination` under `metric` that
/// stays within `budget`.
pub(crate) fn constrained_path(
    snapshot: &Snapshot,
    source: NodeId,
    destination: NodeId,
    metric: Metric,
    filter: EdgeFilter,
    budget: Budget,
    config: SearchConfig,
) -> Result<Option<Path>, QueryError> {
    let mut search = LabelSearch {
        snapshot,
        metric,
        budget,
        config,
        labels: Vec::new(),
        alive: Vec::new(),
        heap: BinaryHeap::new(),
        pareto: vec![Vec::new(); snapshot.node_count()],
        buckets: HashMap::new(),
    };
    search.insert(Label {
        node: source,
        score: metric.origin(),
        hops: 0,
        weight: 0.0,
        toll: 0.0,
        reliability: 1.0,
        pred: None,
    })?;

    // Destination labels tied on (key, hops); the lexicographic choice among
    // them is made once no equally good label can appear.
    let mut found: Option<(f64, u32, Vec<usize>)> = None;

    while let Some(Frontier { key, hops, item: id }) = search.heap.pop() {
        if !search.alive[id] {
            continue;
        }
        if let Some((best_key, best_hops, _)) = &found {
            if key.total_cmp(best_key) != Ordering::Equal || hops != *best_hops {
                break;
            }
        }
        let label = search.labels[id];
        if label.node == destination {
            found.get_or_insert_with(|| (key, hops, Vec::new())).2.push(id);
            continue;
        }
        if found.is_some() {
            continue;
        }

        for (slot, edge) in snapshot.out_edges(label.node).iter().enumerate() {
            if !snapshot.is_available(edge.to)
                || !filter.admits(&edge.attrs)
                || search.on_path(id, edge.to)
            {
                continue;
            }
            let next = label.extend(id, slot, edge.to, &edge.attrs, metric);
            if search.budget.admits(&next) {
                search.insert(next)?;
            }
        }
    }

    tracing::trace!(
        ?metric,
        labels = search.labels.len(),
        found = found.is_some(),
        "label search finished"
    );

    Ok(found.and_then(|(_, _, ids)| {
        ids.into_iter()
            .reduce(|best, id| if search.replaces(id, best) { id } else { best })
            .map(|best| search.reconstruct(best))
    }))
}

impl LabelSearch<'_> {
    fn insert(&mut self, label: Label) -> Result<(), QueryError> {
        if self.labels.len() >= self.config.max_labels {
            return Err(QueryError::LabelLimitExceeded {
                limit: self.config.max_labels,
            });
        }
        let id = self.labels.len();
        self.labels.push(label);
        self.alive.push(true);

        let accepted = match self.config.resolution {
            Resolution::Exact => self.insert_pareto(id),
            Resolution::Buckets(n) => self.insert_bucketed(id, n),
        };
        if accepted {
            self.heap.push(Frontier {
                key: self.metric.key(label.score),
                hops: label.hops,
                item: id,
            });
        } else {
            self.labels.pop();
            self.alive.pop();
        }
        Ok(())
    }

    fn insert_pareto(&mut self, id: usize) -> bool {
        let node = self.labels[id].node.index();
        let frontier = std::mem::take(&mut self.pareto[node]);
        let (frontier, accepted) = self.merge(frontier, id);
        self.pareto[node] = frontier;
        accepted
    }

    fn insert_bucketed(&mut self, id: usize, n: u32) -> bool {
        let label = self.labels[id];
        let slot = (label.node, self.budget.buckets(&label, n));
        let bucket = self.buckets.remove(&slot).unwrap_or_default();
        let (bucket, accepted) = self.merge(bucket, id);
        self.buckets.insert(slot, bucket);
        accepted
    }

    /// Adds `id` to a label set unless a member dominates it, retiring the
    /// members it dominates.
    fn merge(&mut self, set: Vec<usize>, id: usize) -> (Vec<usize>, bool) {
        if set.iter().any(|&other| self.dominates(other, id)) {
            return (set, false);
        }
        let (mut kept, beaten): (Vec<usize>, Vec<usize>) = set
            .into_iter()
            .partition(|&other| !self.dominates(id, other));
        for other in beaten {
            self.alive[other] = false;
        }
        kept.push(id);
        (kept, true)
    }

    /// Objective order: score, then hops, then node sequence.
    fn order(&self, a: usize, b: usize) -> Ordering {
        let (la, lb) = (&self.labels[a], &self.labels[b]);
        self.metric
            .compare(la.score, lb.score)
            .then(la.hops.cmp(&lb.hops))
            .then_with(|| self.node_sequence(a).cmp(&self.node_sequence(b)))
    }

    fn dominates(&self, a: usize, b: usize) -> bool {
        self.budget
            .spends_no_more(&self.labels[a], &self.labels[b])
            && self.order(a, b) != Ordering::Greater
    }

    /// Whether label `a` should win over label `b` in a shared slot.
    fn replaces(&self, a: usize, b: usize) -> bool {
        match self.order(a, b) {
            Ordering::Less => true,
            Ordering::Equal => self.labels[a].resource_cmp(&self.labels[b]) == Ordering::Less,
            Ordering::Greater => false,
        }
    }

    fn on_path(&self, mut id: usize, node: NodeId) -> bool {
        loop {
            let label = &self.labels[id];
            if label.node == node {
                return true;
            }
            match label.pred {
                Some((pred, _)) => id = pred,
                None => return false,
            }
        }
    }

    fn node_sequence(&self, mut id: usize) -> Vec<NodeId> {
        let mut nodes = vec![self.labels[id].node];
        while let Some((pred, _)) = self.labels[id].pred {
            nodes.push(self.labels[pred].node);
            id = pred;
        }
        nodes.reverse();
        nodes
    }

    fn reconstruct(&self, mut id: usize) -> Path {
        let mut nodes = vec![self.labels[id].node];
        let mut edges = Vec::new();
        while let Some((pred, slot)) = self.labels[id].pred {
            let from = self.labels[pred].node;
            edges.push(self.snapshot.out_edges(from)[slot].attrs);
            nodes.push(from);
            id = pred;
        }
        nodes.reverse();
        edges.reverse();
        Path { nodes, edges }
    }
}

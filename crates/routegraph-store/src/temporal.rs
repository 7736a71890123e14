//! Timestamped edge history with "as of" lookups.
//!
//! [`TemporalIndex`] keeps an [`EdgeHistory`] per edge: records of
//! `(timestamp, version)` kept sorted by timestamp. A version is either the
//! attributes in force from that timestamp on, or a removal marker. Node
//! availability has a history of its own; a node with no record is
//! available.
//!
//! Looking up the state at time `t` binary-searches the history for the last
//! record with `timestamp <= t`. No record at or before `t` means the edge did
//! not exist yet; a removal record means it had been removed.
//!
//! Records may arrive out of order. They are placed by binary search, and a
//! second record at an existing timestamp replaces the first.
//!
//! Pair-level recording ([`record_update`](TemporalIndex::record_update),
//! [`record_weight`](TemporalIndex::record_weight),
//! [`record_removal`](TemporalIndex::record_removal)) treats a pair as one
//! logical edge. [`record_insert`](TemporalIndex::record_insert) starts a
//! parallel edge with its own history. Undirected pairs are normalised to
//! `(min, max)`.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use routegraph_core::error::{check_node, check_node_count};
use routegraph_core::{
    CoreError, Directedness, EdgeAttrs, EdgeId, NodeId, OutEdge, Snapshot, SnapshotSource,
    Timestamp,
};

/// State of an edge from a given timestamp on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeVersion {
    Present(EdgeAttrs),
    Removed,
}

/// Ordered history of one edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeHistory {
    id: EdgeId,
    from: NodeId,
    to: NodeId,
    records: Vec<(Timestamp, EdgeVersion)>,
}

impl EdgeHistory {
    fn new(id: EdgeId, from: NodeId, to: NodeId) -> Self {
        EdgeHistory {
            id,
            from,
            to,
            records: Vec::new(),
        }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Endpoints as first recorded.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.from, self.to)
    }

    /// Records sorted by timestamp.
    pub fn records(&self) -> &[(Timestamp, EdgeVersion)] {
        &self.records
    }

    fn record(&mut self, at: Timestamp, version: EdgeVersion) {
        match self.records.binary_search_by_key(&at, |(t, _)| *t) {
            Ok(pos) => self.records[pos].1 = version,
            Err(pos) => self.records.insert(pos, (at, version)),
        }
    }

    /// The version in force at `at`, if any record precedes it.
    pub fn version_at(&self, at: Timestamp) -> Option<&EdgeVersion> {
        let pos = self.records.partition_point(|(t, _)| *t <= at);
        pos.checked_sub(1).map(|i| &self.records[i].1)
    }

    /// Attributes in force at `at`, or `None` if the edge did not exist.
    pub fn attrs_at(&self, at: Timestamp) -> Option<EdgeAttrs> {
        match self.version_at(at) {
            Some(EdgeVersion::Present(attrs)) => Some(*attrs),
            Some(EdgeVersion::Removed) | None => None,
        }
    }
}

/// Timestamped edge store answering queries "as of" any past timestamp.
#[derive(Debug, Clone)]
pub struct TemporalIndex {
    node_count: usize,
    directedness: Directedness,
    /// Histories keyed by edge id, in creation order.
    histories: IndexMap<EdgeId, EdgeHistory>,
    /// Edge ids per (normalised) pair, oldest first.
    pairs: IndexMap<(NodeId, NodeId), SmallVec<[EdgeId; 1]>>,
    /// Every neighbor a node was ever connected to.
    adjacency: Vec<BTreeSet<NodeId>>,
    /// Availability changes per node, sorted by timestamp.
    availability: Vec<Vec<(Timestamp, bool)>>,
    latest: Option<Timestamp>,
}

impl TemporalIndex {
    pub fn new(node_count: usize, directedness: Directedness) -> Result<Self, CoreError> {
        check_node_count(node_count)?;
        Ok(TemporalIndex {
            node_count,
            directedness,
            histories: IndexMap::new(),
            pairs: IndexMap::new(),
            adjacency: vec![BTreeSet::new(); node_count],
            availability: vec![Vec::new(); node_count],
            latest: None,
        })
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Largest timestamp recorded so far.
    pub fn latest_timestamp(&self) -> Option<Timestamp> {
        self.latest
    }

    /// Number of pairs with any history.
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Number of edges with any history, parallel edges counted apart.
    pub fn edge_count(&self) -> usize {
        self.histories.len()
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Starts a new edge `(u, v)` from `at` on, alongside any edges the pair
    /// already has.
    pub fn record_insert(
        &mut self,
        u: NodeId,
        v: NodeId,
        at: Timestamp,
        attrs: EdgeAttrs,
    ) -> Result<EdgeId, CoreError> {
        self.check_pair(u, v)?;
        attrs.validate()?;

        let id = u32::try_from(self.histories.len())
            .map(EdgeId)
            .map_err(|_| CoreError::EdgeIdsExhausted)?;
        let mut history = EdgeHistory::new(id, u, v);
        history.record(at, EdgeVersion::Present(attrs));
        self.histories.insert(id, history);
        let key = self.key(u, v);
        self.pairs.entry(key).or_default().push(id);
        self.adjacency[u.index()].insert(v);
        if !self.directedness.is_directed() {
            self.adjacency[v.index()].insert(u);
        }
        self.observe(at);
        debug!(edge = %id, from = %u, to = %v, at = %at, weight = attrs.weight, "edge inserted");
        Ok(id)
    }

    /// Records `(u, v)` as a single edge with `attrs` from `at` on.
    ///
    /// The oldest edge present at `at` takes the attributes and the pair's
    /// other present edges are marked removed. A pair with no history gets a
    /// new edge.
    pub fn record_update(
        &mut self,
        u: NodeId,
        v: NodeId,
        at: Timestamp,
        attrs: EdgeAttrs,
    ) -> Result<EdgeId, CoreError> {
        self.check_pair(u, v)?;
        attrs.validate()?;

        let ids = self.pair_ids(u, v);
        let Some(&oldest) = ids.first() else {
            return self.record_insert(u, v, at, attrs);
        };
        let present = self.present_ids(&ids, at);
        let keep = present.first().copied().unwrap_or(oldest);
        for &id in &present {
            let version = if id == keep {
                EdgeVersion::Present(attrs)
            } else {
                EdgeVersion::Removed
            };
            self.record_edge(id, at, version);
        }
        if present.is_empty() {
            self.record_edge(keep, at, EdgeVersion::Present(attrs));
        }
        self.observe(at);
        debug!(edge = %keep, from = %u, to = %v, at = %at, weight = attrs.weight, "edge version recorded");
        Ok(keep)
    }

    /// Records a new weight for every edge of `(u, v)` present at `at`,
    /// keeping their other attributes. A pair with no edge at `at` is
    /// recorded as a fresh edge of that weight.
    pub fn record_weight(
        &mut self,
        u: NodeId,
        v: NodeId,
        at: Timestamp,
        weight: f64,
    ) -> Result<(), CoreError> {
        self.check_pair(u, v)?;
        EdgeAttrs::new(weight).validate()?;

        let edges = self.edges_at(u, v, at)?;
        if edges.is_empty() {
            self.record_update(u, v, at, EdgeAttrs::new(weight))?;
            return Ok(());
        }
        for (id, mut attrs) in edges {
            attrs.weight = weight;
            self.record_edge(id, at, EdgeVersion::Present(attrs));
        }
        self.observe(at);
        debug!(from = %u, to = %v, at = %at, weight, "edge reweight recorded");
        Ok(())
    }

    /// Records that every edge of `(u, v)` is absent from `at` on. Returns
    /// `false` (no-op) if the pair has no history at all.
    pub fn record_removal(&mut self, u: NodeId, v: NodeId, at: Timestamp) -> Result<bool, CoreError> {
        self.check_pair(u, v)?;
        let ids = self.pair_ids(u, v);
        if ids.is_empty() {
            return Ok(false);
        }
        for id in ids {
            self.record_edge(id, at, EdgeVersion::Removed);
        }
        self.observe(at);
        debug!(from = %u, to = %v, at = %at, "edge removal recorded");
        Ok(true)
    }

    /// Records whether `node` can be traversed from `at` on.
    pub fn record_availability(
        &mut self,
        node: NodeId,
        at: Timestamp,
        available: bool,
    ) -> Result<(), CoreError> {
        check_node(node, self.node_count)?;
        let changes = &mut self.availability[node.index()];
        match changes.binary_search_by_key(&at, |(t, _)| *t) {
            Ok(pos) => changes[pos].1 = available,
            Err(pos) => changes.insert(pos, (at, available)),
        }
        self.observe(at);
        debug!(node = %node, at = %at, available, "availability recorded");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Attributes of `(u, v)` in force at `at`. With parallel edges this is
    /// the oldest one present.
    pub fn effective_attrs(
        &self,
        u: NodeId,
        v: NodeId,
        at: Timestamp,
    ) -> Result<Option<EdgeAttrs>, CoreError> {
        Ok(self.edges_at(u, v, at)?.first().map(|(_, attrs)| *attrs))
    }

    /// Weight of `(u, v)` in force at `at`.
    pub fn effective_weight(&self, u: NodeId, v: NodeId, at: Timestamp) -> Result<Option<f64>, CoreError> {
        Ok(self.effective_attrs(u, v, at)?.map(|a| a.weight))
    }

    /// Every edge of `(u, v)` present at `at`, ordered by id.
    pub fn edges_at(
        &self,
        u: NodeId,
        v: NodeId,
        at: Timestamp,
    ) -> Result<Vec<(EdgeId, EdgeAttrs)>, CoreError> {
        self.check_pair(u, v)?;
        Ok(self
            .pair_ids(u, v)
            .into_iter()
            .filter_map(|id| {
                self.histories
                    .get(&id)
                    .and_then(|h| h.attrs_at(at))
                    .map(|attrs| (id, attrs))
            })
            .collect())
    }

    /// History of the oldest edge of `(u, v)`.
    pub fn history(&self, u: NodeId, v: NodeId) -> Result<Option<&EdgeHistory>, CoreError> {
        self.check_pair(u, v)?;
        Ok(self
            .pair_ids(u, v)
            .first()
            .and_then(|id| self.histories.get(id)))
    }

    pub fn edge_history(&self, id: EdgeId) -> Option<&EdgeHistory> {
        self.histories.get(&id)
    }

    /// Whether `node` was available at `at`.
    pub fn is_available_at(&self, node: NodeId, at: Timestamp) -> Result<bool, CoreError> {
        check_node(node, self.node_count)?;
        Ok(self.available_at(node.index(), at))
    }

    /// Edges leaving `node` that exist at `at`, ordered by neighbor then id.
    pub fn neighbors_at(
        &self,
        node: NodeId,
        at: Timestamp,
    ) -> Result<Vec<(NodeId, EdgeId, EdgeAttrs)>, CoreError> {
        check_node(node, self.node_count)?;
        let mut neighbors = Vec::new();
        for &v in &self.adjacency[node.index()] {
            for (id, attrs) in self.edges_at(node, v, at)? {
                neighbors.push((v, id, attrs));
            }
        }
        Ok(neighbors)
    }

    /// The graph as it was at `at`, node availability included.
    pub fn snapshot_at(&self, at: Timestamp) -> Snapshot {
        let mut adjacency: Vec<Vec<OutEdge>> = vec![Vec::new(); self.node_count];
        for history in self.histories.values() {
            let Some(attrs) = history.attrs_at(at) else {
                continue;
            };
            let (u, v) = history.endpoints();
            let edge = history.id();
            adjacency[u.index()].push(OutEdge { to: v, edge, attrs });
            if !self.directedness.is_directed() && u != v {
                adjacency[v.index()].push(OutEdge { to: u, edge, attrs });
            }
        }
        let available = (0..self.node_count)
            .map(|i| self.available_at(i, at))
            .collect();
        Snapshot::from_adjacency(adjacency, available)
    }

    /// The graph after every recorded change.
    pub fn latest_snapshot(&self) -> Snapshot {
        self.snapshot_at(Timestamp(u64::MAX))
    }

    /// A [`SnapshotSource`] pinned to `at`.
    pub fn view_at(&self, at: Timestamp) -> TemporalView<'_> {
        TemporalView { index: self, at }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn check_pair(&self, u: NodeId, v: NodeId) -> Result<(), CoreError> {
        check_node(u, self.node_count)?;
        check_node(v, self.node_count)
    }

    fn key(&self, u: NodeId, v: NodeId) -> (NodeId, NodeId) {
        if self.directedness.is_directed() {
            (u, v)
        } else {
            (u.min(v), u.max(v))
        }
    }

    fn pair_ids(&self, u: NodeId, v: NodeId) -> SmallVec<[EdgeId; 1]> {
        self.pairs
            .get(&self.key(u, v))
            .cloned()
            .unwrap_or_default()
    }

    fn present_ids(&self, ids: &[EdgeId], at: Timestamp) -> SmallVec<[EdgeId; 1]> {
        ids.iter()
            .copied()
            .filter(|id| {
                self.histories
                    .get(id)
                    .map_or(false, |h| h.attrs_at(at).is_some())
            })
            .collect()
    }

    fn record_edge(&mut self, id: EdgeId, at: Timestamp, version: EdgeVersion) {
        if let Some(history) = self.histories.get_mut(&id) {
            history.record(at, version);
        }
    }

    fn available_at(&self, node: usize, at: Timestamp) -> bool {
        let changes = &self.availability[node];
        let pos = changes.partition_point(|(t, _)| *t <= at);
        pos.checked_sub(1).map_or(true, |i| changes[i].1)
    }

    fn observe(&mut self, at: Timestamp) {
        self.latest = Some(self.latest.map_or(at, |latest| latest.max(at)));
    }
}

/// A temporal index viewed at a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct TemporalView<'a> {
    index: &'a TemporalIndex,
    at: Timestamp,
}

impl SnapshotSource for TemporalView<'_> {
    fn snapshot(&self) -> Snapshot {
        self.index.snapshot_at(self.at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(id: u32) -> NodeId {
        NodeId(id)
    }

    fn t(at: u64) -> Timestamp {
        Timestamp(at)
    }

    #[test]
    fn weight_lookup_follows_timestamps() {
        let mut index = TemporalIndex::new(2, Directedness::Undirected).unwrap();
        index.record_update(n(0), n(1), t(0), EdgeAttrs::new(10.0)).unwrap();
        index.record_weight(n(0), n(1), t(1), 15.0).unwrap();

        assert_eq!(index.effective_weight(n(0), n(1), t(0)).unwrap(), Some(10.0));
        assert_eq!(index.effective_weight(n(0), n(1), t(2)).unwrap(), Some(15.0));
        assert_eq!(index.effective_weight(n(1), n(0), t(1)).unwrap(), Some(15.0));
    }

    #[test]
    fn lookup_before_first_record_finds_nothing() {
        let mut index = TemporalIndex::new(2, Directedness::Directed).unwrap();
        index.record_update(n(0), n(1), t(5), EdgeAttrs::new(1.0)).unwrap();
        assert_eq!(index.effective_attrs(n(0), n(1), t(4)).unwrap(), None);
        assert_eq!(index.effective_attrs(n(1), n(0), t(9)).unwrap(), None);
    }

    #[test]
    fn removal_hides_edge_until_reinserted() {
        let mut index = TemporalIndex::new(2, Directedness::Undirected).unwrap();
        index.record_update(n(0), n(1), t(1), EdgeAttrs::new(3.0)).unwrap();
        assert!(index.record_removal(n(1), n(0), t(3)).unwrap());
        index.record_update(n(0), n(1), t(6), EdgeAttrs::new(4.0)).unwrap();

        assert_eq!(index.effective_weight(n(0), n(1), t(2)).unwrap(), Some(3.0));
        assert_eq!(index.effective_weight(n(0), n(1), t(3)).unwrap(), None);
        assert_eq!(index.effective_weight(n(0), n(1), t(5)).unwrap(), None);
        assert_eq!(index.effective_weight(n(0), n(1), t(6)).unwrap(), Some(4.0));
    }

    #[test]
    fn removal_of_unknown_pair_is_a_noop() {
        let mut index = TemporalIndex::new(3, Directedness::Undirected).unwrap();
        assert!(!index.record_removal(n(0), n(2), t(1)).unwrap());
        assert_eq!(index.pair_count(), 0);
        assert_eq!(index.latest_timestamp(), None);
    }

    #[test]
    fn out_of_order_records_are_sorted() {
        let mut index = TemporalIndex::new(2, Directedness::Directed).unwrap();
        index.record_update(n(0), n(1), t(10), EdgeAttrs::new(3.0)).unwrap();
        index.record_update(n(0), n(1), t(2), EdgeAttrs::new(1.0)).unwrap();
        index.record_update(n(0), n(1), t(6), EdgeAttrs::new(2.0)).unwrap();

        let history = index.history(n(0), n(1)).unwrap().unwrap();
        let stamps: Vec<u64> = history.records().iter().map(|(at, _)| at.0).collect();
        assert_eq!(stamps, vec![2, 6, 10]);
        assert_eq!(index.effective_weight(n(0), n(1), t(7)).unwrap(), Some(2.0));
        assert_eq!(index.latest_timestamp(), Some(t(10)));
    }

    #[test]
    fn same_timestamp_replaces_record() {
        let mut index = TemporalIndex::new(2, Directedness::Directed).unwrap();
        index.record_update(n(0), n(1), t(1), EdgeAttrs::new(3.0)).unwrap();
        index.record_update(n(0), n(1), t(1), EdgeAttrs::new(8.0)).unwrap();
        let history = index.history(n(0), n(1)).unwrap().unwrap();
        assert_eq!(history.records().len(), 1);
        assert_eq!(index.effective_weight(n(0), n(1), t(1)).unwrap(), Some(8.0));
    }

    #[test]
    fn record_weight_keeps_other_attributes() {
        let mut index = TemporalIndex::new(2, Directedness::Undirected).unwrap();
        let attrs = EdgeAttrs::new(10.0).with_capacity(50.0).with_toll(2.0);
        index.record_update(n(0), n(1), t(0), attrs).unwrap();
        index.record_weight(n(0), n(1), t(4), 12.0).unwrap();

        let later = index.effective_attrs(n(0), n(1), t(4)).unwrap().unwrap();
        assert_eq!(later.weight, 12.0);
        assert_eq!(later.capacity, Some(50.0));
        assert_eq!(later.toll, 2.0);
    }

    #[test]
    fn neighbors_at_reflects_time_slice() {
        let mut index = TemporalIndex::new(3, Directedness::Undirected).unwrap();
        index.record_update(n(0), n(1), t(0), EdgeAttrs::new(1.0)).unwrap();
        index.record_update(n(2), n(0), t(2), EdgeAttrs::new(2.0)).unwrap();
        index.record_removal(n(0), n(1), t(3)).unwrap();

        let ids = |at| -> Vec<u32> {
            index
                .neighbors_at(n(0), t(at))
                .unwrap()
                .into_iter()
                .map(|(v, _, _)| v.0)
                .collect()
        };
        assert_eq!(ids(0), vec![1]);
        assert_eq!(ids(2), vec![1, 2]);
        assert_eq!(ids(3), vec![2]);
    }

    #[test]
    fn snapshot_at_builds_time_slice() {
        let mut index = TemporalIndex::new(3, Directedness::Directed).unwrap();
        index.record_update(n(0), n(1), t(0), EdgeAttrs::new(1.0)).unwrap();
        index.record_update(n(1), n(2), t(5), EdgeAttrs::new(1.0)).unwrap();

        let early = index.snapshot_at(t(1));
        assert_eq!(early.out_edge_count(), 1);
        let late = index.view_at(t(5)).snapshot();
        assert_eq!(late.out_edge_count(), 2);
        assert_eq!(index.latest_snapshot(), late);
    }

    #[test]
    fn invalid_input_is_rejected() {
        let mut index = TemporalIndex::new(2, Directedness::Directed).unwrap();
        assert!(index.record_update(n(0), n(2), t(0), EdgeAttrs::new(1.0)).is_err());
        assert!(index.record_update(n(0), n(1), t(0), EdgeAttrs::new(-1.0)).is_err());
        assert!(index.effective_weight(n(3), n(1), t(0)).is_err());
        assert!(index.neighbors_at(n(2), t(0)).is_err());
    }

    #[test]
    fn history_serializes_as_tagged_records() {
        let mut index = TemporalIndex::new(2, Directedness::Directed).unwrap();
        index.record_update(n(0), n(1), t(1), EdgeAttrs::new(2.0)).unwrap();
        index.record_removal(n(0), n(1), t(4)).unwrap();

        let history = index.history(n(0), n(1)).unwrap().unwrap();
        let json = serde_json::to_value(history).unwrap();
        assert_eq!(json["id"], 0);
        assert_eq!(json["records"][1], serde_json::json!([4, "removed"]));
        let back: EdgeHistory = serde_json::from_value(json).unwrap();
        assert_eq!(&back, history);
    }

    #[test]
    fn parallel_inserts_keep_separate_histories() {
        let mut index = TemporalIndex::new(2, Directedness::Undirected).unwrap();
        let first = index.record_insert(n(0), n(1), t(1), EdgeAttrs::new(5.0)).unwrap();
        let second = index.record_insert(n(1), n(0), t(2), EdgeAttrs::new(100.0)).unwrap();
        assert_ne!(first, second);
        assert_eq!(index.pair_count(), 1);
        assert_eq!(index.edge_count(), 2);

        assert_eq!(index.edges_at(n(0), n(1), t(1)).unwrap().len(), 1);
        let both = index.edges_at(n(0), n(1), t(2)).unwrap();
        assert_eq!(both, vec![(first, EdgeAttrs::new(5.0)), (second, EdgeAttrs::new(100.0))]);
        assert_eq!(index.effective_weight(n(0), n(1), t(2)).unwrap(), Some(5.0));
        assert_eq!(index.edge_history(second).unwrap().endpoints(), (n(1), n(0)));
        assert_eq!(index.snapshot_at(t(2)).out_edge_count(), 4);
    }

    #[test]
    fn pair_update_collapses_parallel_edges() {
        let mut index = TemporalIndex::new(2, Directedness::Directed).unwrap();
        let first = index.record_insert(n(0), n(1), t(0), EdgeAttrs::new(5.0)).unwrap();
        index.record_insert(n(0), n(1), t(0), EdgeAttrs::new(9.0)).unwrap();

        index.record_weight(n(0), n(1), t(1), 7.0).unwrap();
        let weights: Vec<f64> = index
            .edges_at(n(0), n(1), t(1))
            .unwrap()
            .into_iter()
            .map(|(_, a)| a.weight)
            .collect();
        assert_eq!(weights, vec![7.0, 7.0]);

        let kept = index.record_update(n(0), n(1), t(2), EdgeAttrs::new(3.0)).unwrap();
        assert_eq!(kept, first);
        assert_eq!(
            index.edges_at(n(0), n(1), t(2)).unwrap(),
            vec![(first, EdgeAttrs::new(3.0))]
        );
        assert_eq!(index.edges_at(n(0), n(1), t(1)).unwrap().len(), 2);

        assert!(index.record_removal(n(0), n(1), t(3)).unwrap());
        assert!(index.edges_at(n(0), n(1), t(3)).unwrap().is_empty());
    }

    #[test]
    fn availability_follows_timestamps() {
        let mut index = TemporalIndex::new(3, Directedness::Undirected).unwrap();
        index.record_insert(n(0), n(1), t(0), EdgeAttrs::new(1.0)).unwrap();
        index.record_availability(n(1), t(4), false).unwrap();
        index.record_availability(n(1), t(8), true).unwrap();

        assert!(index.is_available_at(n(1), t(3)).unwrap());
        assert!(!index.is_available_at(n(1), t(4)).unwrap());
        assert!(index.is_available_at(n(1), t(9)).unwrap());
        assert!(index.is_available_at(n(2), t(4)).unwrap());
        assert!(!index.snapshot_at(t(5)).is_available(n(1)));
        assert!(index.latest_snapshot().is_available(n(1)));
        assert_eq!(index.latest_timestamp(), Some(t(8)));
        assert!(index.record_availability(n(3), t(0), false).is_err());
    }
}

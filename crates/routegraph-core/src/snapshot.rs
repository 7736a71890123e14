//! Immutable adjacency snapshots.
//!
//! Queries never read a store directly. They read a [`Snapshot`]: a compact
//! CSR (compressed sparse row) copy of the adjacency taken at one instant.
//! A snapshot is `Send + Sync` and never changes, so any number of queries
//! can run against it in parallel while the store keeps mutating.
//!
//! Out-edges of a node are ordered by `(target, edge id)`, which makes every
//! traversal order, and therefore every query result, deterministic.

use serde::Serialize;

use crate::edge::EdgeAttrs;
use crate::error::{check_node, check_node_count, CoreError};
use crate::id::{EdgeId, NodeId};

/// One directed traversal option out of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutEdge {
    pub to: NodeId,
    pub edge: EdgeId,
    pub attrs: EdgeAttrs,
}

/// Read-only CSR adjacency over nodes `0..node_count`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// `offsets[u]..offsets[u + 1]` indexes `edges` for node `u`.
    offsets: Vec<usize>,
    edges: Vec<OutEdge>,
    available: Vec<bool>,
}

impl Snapshot {
    /// A snapshot with `node_count` nodes and no edges.
    pub fn empty(node_count: usize) -> Self {
        Snapshot {
            offsets: vec![0; node_count + 1],
            edges: Vec::new(),
            available: vec![true; node_count],
        }
    }

    /// Builds a snapshot from per-node out-edge lists.
    ///
    /// Callers guarantee that every target is below `adjacency.len()`, that
    /// attributes are valid and that `available.len() == adjacency.len()`.
    /// Stores use this after validating on insertion; untrusted input goes
    /// through [`SnapshotBuilder`].
    pub fn from_adjacency(adjacency: Vec<Vec<OutEdge>>, available: Vec<bool>) -> Self {
        debug_assert_eq!(adjacency.len(), available.len());
        let mut offsets = Vec::with_capacity(adjacency.len() + 1);
        let mut edges = Vec::with_capacity(adjacency.iter().map(Vec::len).sum());
        offsets.push(0);
        for mut list in adjacency {
            list.sort_by_key(|e| (e.to, e.edge));
            edges.extend(list);
            offsets.push(edges.len());
        }
        debug_assert!(edges.iter().all(|e| e.to.index() < available.len()));
        Snapshot {
            offsets,
            edges,
            available,
        }
    }

    pub fn node_count(&self) -> usize {
        self.available.len()
    }

    /// Number of directed traversal options (an undirected edge counts twice).
    pub fn out_edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Out-edges of `node`, ordered by `(target, edge id)`.
    ///
    /// Panics if `node` is out of range; use [`Snapshot::check_node`] first
    /// for untrusted input.
    pub fn out_edges(&self, node: NodeId) -> &[OutEdge] {
        let u = node.index();
        &self.edges[self.offsets[u]..self.offsets[u + 1]]
    }

    /// Whether a search may enter `node`.
    pub fn is_available(&self, node: NodeId) -> bool {
        self.available.get(node.index()).copied().unwrap_or(false)
    }

    /// Validates a node id against this snapshot.
    pub fn check_node(&self, node: NodeId) -> Result<(), CoreError> {
        check_node(node, self.node_count())
    }

    /// Iterates over every out-edge as `(from, edge)`.
    pub fn iter_edges(&self) -> impl Iterator<Item = (NodeId, &OutEdge)> + '_ {
        (0..self.node_count()).flat_map(move |u| {
            let from = NodeId(u as u32);
            self.out_edges(from).iter().map(move |e| (from, e))
        })
    }
}

/// Anything that can produce a consistent [`Snapshot`] of its current state.
pub trait SnapshotSource {
    fn snapshot(&self) -> Snapshot;
}

impl SnapshotSource for Snapshot {
    fn snapshot(&self) -> Snapshot {
        self.clone()
    }
}

/// Incremental, validating builder for [`Snapshot`]. Edges may be pushed in
/// any order.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    adjacency: Vec<Vec<OutEdge>>,
    available: Vec<bool>,
}

impl SnapshotBuilder {
    pub fn new(node_count: usize) -> Result<Self, CoreError> {
        check_node_count(node_count)?;
        Ok(SnapshotBuilder {
            adjacency: vec![Vec::new(); node_count],
            available: vec![true; node_count],
        })
    }

    /// Adds a directed traversal option `from -> edge.to`.
    pub fn push(&mut self, from: NodeId, edge: OutEdge) -> Result<(), CoreError> {
        let node_count = self.available.len();
        check_node(from, node_count)?;
        check_node(edge.to, node_count)?;
        edge.attrs.validate()?;
        self.adjacency[from.index()].push(edge);
        Ok(())
    }

    /// Adds `u -> v`, and `v -> u` as well when `directed` is false.
    pub fn push_link(
        &mut self,
        u: NodeId,
        v: NodeId,
        edge: EdgeId,
        attrs: EdgeAttrs,
        directed: bool,
    ) -> Result<(), CoreError> {
        self.push(u, OutEdge { to: v, edge, attrs })?;
        if !directed && u != v {
            self.push(v, OutEdge { to: u, edge, attrs })?;
        }
        Ok(())
    }

    pub fn set_available(&mut self, node: NodeId, available: bool) -> Result<(), CoreError> {
        check_node(node, self.available.len())?;
        self.available[node.index()] = available;
        Ok(())
    }

    pub fn build(self) -> Snapshot {
        Snapshot::from_adjacency(self.adjacency, self.available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out(to: u32, edge: u32, weight: f64) -> OutEdge {
        OutEdge {
            to: NodeId(to),
            edge: EdgeId(edge),
            attrs: EdgeAttrs::new(weight),
        }
    }

    #[test]
    fn empty_snapshot_has_no_edges() {
        let snap = Snapshot::empty(3);
        assert_eq!(snap.node_count(), 3);
        assert_eq!(snap.out_edge_count(), 0);
        assert!(snap.out_edges(NodeId(2)).is_empty());
        assert!(snap.is_available(NodeId(0)));
        assert!(!snap.is_available(NodeId(3)));
    }

    #[test]
    fn build_orders_out_edges_by_target_then_edge() {
        let mut builder = SnapshotBuilder::new(4).unwrap();
        builder.push(NodeId(0), out(3, 0, 1.0)).unwrap();
        builder.push(NodeId(0), out(1, 5, 1.0)).unwrap();
        builder.push(NodeId(0), out(1, 2, 1.0)).unwrap();
        builder.push(NodeId(2), out(0, 1, 1.0)).unwrap();
        let snap = builder.build();

        let targets: Vec<(u32, u32)> = snap
            .out_edges(NodeId(0))
            .iter()
            .map(|e| (e.to.0, e.edge.0))
            .collect();
        assert_eq!(targets, vec![(1, 2), (1, 5), (3, 0)]);
        assert!(snap.out_edges(NodeId(1)).is_empty());
        assert_eq!(snap.out_edges(NodeId(2)).len(), 1);
        assert_eq!(snap.iter_edges().count(), 4);
    }

    #[test]
    fn push_link_mirrors_undirected_edges() {
        let mut builder = SnapshotBuilder::new(2).unwrap();
        builder
            .push_link(NodeId(0), NodeId(1), EdgeId(0), EdgeAttrs::new(5.0), false)
            .unwrap();
        let snap = builder.build();
        assert_eq!(snap.out_edges(NodeId(0))[0].to, NodeId(1));
        assert_eq!(snap.out_edges(NodeId(1))[0].to, NodeId(0));
    }

    #[test]
    fn push_rejects_out_of_range_and_invalid_edges() {
        let mut builder = SnapshotBuilder::new(2).unwrap();
        assert!(matches!(
            builder.push(NodeId(2), out(0, 0, 1.0)),
            Err(CoreError::NodeOutOfRange { .. })
        ));
        assert!(matches!(
            builder.push(NodeId(0), out(0, 0, -1.0)),
            Err(CoreError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn unavailable_nodes_are_recorded() {
        let mut builder = SnapshotBuilder::new(2).unwrap();
        builder.set_available(NodeId(1), false).unwrap();
        let snap = builder.build();
        assert!(snap.is_available(NodeId(0)));
        assert!(!snap.is_available(NodeId(1)));
    }
}

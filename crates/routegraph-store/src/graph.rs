//! GraphStore: the mutable current-state routing graph.
//!
//! [`GraphStore`] owns a petgraph `StableGraph` created with a fixed number
//! of nodes. Edges are stored as directed petgraph edges; an undirected
//! logical edge is mirrored as two petgraph edges sharing one [`EdgeId`].
//! `StableGraph` keeps edge indices valid across removals, so the
//! `EdgeId -> EdgeIndex` table never needs rewriting.
//!
//! Parallel edges between the same pair are allowed. `add_edge` always
//! inserts a new one; `add_or_update_edge` collapses the pair into a single
//! edge.
//!
//! Every successful mutation bumps [`GraphStore::generation`], which the
//! shared store uses to decide whether a cached snapshot is still current.

use std::collections::HashMap;

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::Directed;
use smallvec::SmallVec;
use tracing::debug;

use routegraph_core::error::{check_node, check_node_count};
use routegraph_core::{
    CoreError, Directedness, EdgeAttrs, EdgeId, NodeId, OutEdge, Snapshot, SnapshotSource,
};

/// Edge payload stored in the petgraph graph.
#[derive(Debug, Clone, Copy)]
struct EdgeRecord {
    id: EdgeId,
    attrs: EdgeAttrs,
}

/// Node payload stored in the petgraph graph.
#[derive(Debug, Clone, Copy)]
struct NodeState {
    available: bool,
}

/// In-memory routing graph with a fixed node count.
#[derive(Debug, Clone)]
pub struct GraphStore {
    graph: StableGraph<NodeState, EdgeRecord, Directed, u32>,
    directedness: Directedness,
    /// Petgraph edges backing each logical edge: one for directed edges and
    /// self-loops, two for mirrored undirected edges.
    links: HashMap<EdgeId, SmallVec<[EdgeIndex<u32>; 2]>>,
    next_edge_id: u32,
    generation: u64,
}

impl GraphStore {
    /// Creates a store with nodes `0..node_count` and no edges.
    pub fn new(node_count: usize, directedness: Directedness) -> Result<Self, CoreError> {
        check_node_count(node_count)?;
        let mut graph = StableGraph::with_capacity(node_count, 0);
        for _ in 0..node_count {
            graph.add_node(NodeState { available: true });
        }
        Ok(GraphStore {
            graph,
            directedness,
            links: HashMap::new(),
            next_edge_id: 0,
            generation: 0,
        })
    }

    pub fn directed(node_count: usize) -> Result<Self, CoreError> {
        Self::new(node_count, Directedness::Directed)
    }

    pub fn undirected(node_count: usize) -> Result<Self, CoreError> {
        Self::new(node_count, Directedness::Undirected)
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of logical edges (an undirected edge counts once).
    pub fn edge_count(&self) -> usize {
        self.links.len()
    }

    pub fn directedness(&self) -> Directedness {
        self.directedness
    }

    /// Counter bumped by every successful mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Out-neighbors of `node` with current attributes. For undirected
    /// stores this includes every incident edge.
    pub fn neighbors(
        &self,
        node: NodeId,
    ) -> Result<impl Iterator<Item = (NodeId, EdgeId, &EdgeAttrs)> + '_, CoreError> {
        let idx = self.index(node)?;
        Ok(self.graph.edges(idx).map(|e| {
            let record = e.weight();
            (NodeId::from(e.target()), record.id, &record.attrs)
        }))
    }

    /// All logical edges from `u` to `v`, ordered by id.
    pub fn edges_between(&self, u: NodeId, v: NodeId) -> Result<Vec<(EdgeId, EdgeAttrs)>, CoreError> {
        let (a, b) = (self.index(u)?, self.index(v)?);
        let mut edges: Vec<(EdgeId, EdgeAttrs)> = self
            .graph
            .edges_connecting(a, b)
            .map(|e| (e.weight().id, e.weight().attrs))
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.dedup_by_key(|(id, _)| *id);
        Ok(edges)
    }

    /// Looks up a logical edge, returning `(u, v, attrs)` as inserted.
    pub fn edge(&self, id: EdgeId) -> Option<(NodeId, NodeId, EdgeAttrs)> {
        let &first = self.links.get(&id)?.first()?;
        let (a, b) = self.graph.edge_endpoints(first)?;
        let record = self.graph.edge_weight(first)?;
        Some((NodeId::from(a), NodeId::from(b), record.attrs))
    }

    pub fn is_node_available(&self, node: NodeId) -> Result<bool, CoreError> {
        let idx = self.index(node)?;
        Ok(self.graph.node_weight(idx).map_or(false, |n| n.available))
    }

    // -----------------------------------------------------------------------
    // Edge mutations
    // -----------------------------------------------------------------------

    /// Inserts a new edge, even if the pair is already connected.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, attrs: EdgeAttrs) -> Result<EdgeId, CoreError> {
        let (a, b) = (self.index(u)?, self.index(v)?);
        attrs.validate()?;

        let id = EdgeId(self.next_edge_id);
        self.next_edge_id = self
            .next_edge_id
            .checked_add(1)
            .ok_or(CoreError::EdgeIdsExhausted)?;
        self.insert_link(id, a, b, attrs);
        self.generation += 1;
        debug!(edge = %id, from = %u, to = %v, weight = attrs.weight, "edge added");

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Ok(id)
    }

    /// Inserts the edge, or overwrites the pair when already connected.
    ///
    /// When the pair has parallel edges, the oldest keeps its id and takes
    /// the new attributes; the others are dropped.
    pub fn add_or_update_edge(
        &mut self,
        u: NodeId,
        v: NodeId,
        attrs: EdgeAttrs,
    ) -> Result<EdgeId, CoreError> {
        let (a, b) = (self.index(u)?, self.index(v)?);
        attrs.validate()?;

        let ids = self.link_ids_between(a, b);
        let Some((&keep, rest)) = ids.split_first() else {
            return self.add_edge(u, v, attrs);
        };

        for id in rest {
            self.remove_link(*id);
        }
        self.set_link_attrs(keep, |current| *current = attrs);
        self.generation += 1;
        debug!(edge = %keep, from = %u, to = %v, weight = attrs.weight, dropped = rest.len(), "edge overwritten");

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Ok(keep)
    }

    /// Reweights every edge from `u` to `v`. Returns `false` (no-op) when
    /// the pair is not connected.
    pub fn update_edge(&mut self, u: NodeId, v: NodeId, weight: f64) -> Result<bool, CoreError> {
        let (a, b) = (self.index(u)?, self.index(v)?);
        EdgeAttrs::new(weight).validate()?;

        let ids = self.link_ids_between(a, b);
        if ids.is_empty() {
            return Ok(false);
        }
        for id in &ids {
            self.set_link_attrs(*id, |attrs| attrs.weight = weight);
        }
        self.generation += 1;
        debug!(from = %u, to = %v, weight, edges = ids.len(), "edge reweighted");
        Ok(true)
    }

    /// Removes every edge from `u` to `v` and returns how many logical edges
    /// were removed. Removing a missing edge is a no-op.
    pub fn remove_edge(&mut self, u: NodeId, v: NodeId) -> Result<usize, CoreError> {
        let (a, b) = (self.index(u)?, self.index(v)?);
        let ids = self.link_ids_between(a, b);
        for id in &ids {
            self.remove_link(*id);
        }
        if !ids.is_empty() {
            self.generation += 1;
            debug!(from = %u, to = %v, edges = ids.len(), "edge removed");
        }

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Ok(ids.len())
    }

    /// Removes a single logical edge. Returns `false` if it does not exist.
    pub fn remove_edge_by_id(&mut self, id: EdgeId) -> bool {
        if !self.links.contains_key(&id) {
            return false;
        }
        self.remove_link(id);
        self.generation += 1;
        debug!(edge = %id, "edge removed by id");

        #[cfg(debug_assertions)]
        self.assert_consistency();

        true
    }

    // -----------------------------------------------------------------------
    // Node mutations
    // -----------------------------------------------------------------------

    /// Marks a node as (un)available. Searches never enter unavailable nodes.
    pub fn set_node_available(&mut self, node: NodeId, available: bool) -> Result<(), CoreError> {
        let idx = self.index(node)?;
        if let Some(state) = self.graph.node_weight_mut(idx) {
            if state.available != available {
                state.available = available;
                self.generation += 1;
                debug!(node = %node, available, "node availability changed");
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// Copies the current adjacency into an immutable [`Snapshot`].
    pub fn snapshot(&self) -> Snapshot {
        let node_count = self.node_count();
        let mut adjacency = Vec::with_capacity(node_count);
        let mut available = Vec::with_capacity(node_count);
        for u in 0..node_count {
            let idx = NodeIndex::<u32>::new(u);
            available.push(self.graph.node_weight(idx).map_or(false, |n| n.available));
            adjacency.push(
                self.graph
                    .edges(idx)
                    .map(|e| OutEdge {
                        to: NodeId::from(e.target()),
                        edge: e.weight().id,
                        attrs: e.weight().attrs,
                    })
                    .collect::<Vec<_>>(),
            );
        }
        Snapshot::from_adjacency(adjacency, available)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn index(&self, node: NodeId) -> Result<NodeIndex<u32>, CoreError> {
        check_node(node, self.node_count())?;
        Ok(node.into())
    }

    fn link_ids_between(&self, a: NodeIndex<u32>, b: NodeIndex<u32>) -> Vec<EdgeId> {
        let mut ids: Vec<EdgeId> = self
            .graph
            .edges_connecting(a, b)
            .map(|e| e.weight().id)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    fn insert_link(&mut self, id: EdgeId, a: NodeIndex<u32>, b: NodeIndex<u32>, attrs: EdgeAttrs) {
        let record = EdgeRecord { id, attrs };
        let mut indices = SmallVec::new();
        indices.push(self.graph.add_edge(a, b, record));
        if !self.directedness.is_directed() && a != b {
            indices.push(self.graph.add_edge(b, a, record));
        }
        self.links.insert(id, indices);
    }

    fn remove_link(&mut self, id: EdgeId) {
        if let Some(indices) = self.links.remove(&id) {
            for idx in indices {
                self.graph.remove_edge(idx);
            }
        }
    }

    fn set_link_attrs(&mut self, id: EdgeId, mut apply: impl FnMut(&mut EdgeAttrs)) {
        if let Some(indices) = self.links.get(&id) {
            for &idx in indices {
                if let Some(record) = self.graph.edge_weight_mut(idx) {
                    apply(&mut record.attrs);
                }
            }
        }
    }

    /// Verifies that every logical edge is backed by the right petgraph
    /// edges and that mirrored halves agree.
    ///
    /// Only called in debug builds (via `cfg(debug_assertions)`).
    #[cfg(debug_assertions)]
    fn assert_consistency(&self) {
        let mut backing = 0;
        for (id, indices) in &self.links {
            backing += indices.len();
            let (a, b) = self
                .graph
                .edge_endpoints(indices[0])
                .unwrap_or_else(|| panic!("edge {} has a dangling index", id));
            let expected = if self.directedness.is_directed() || a == b { 1 } else { 2 };
            assert_eq!(indices.len(), expected, "edge {} has wrong mirror count", id);
            let first = self.graph[indices[0]];
            assert_eq!(first.id, *id, "edge {} payload id mismatch", id);
            if let Some(&mirror) = indices.get(1) {
                assert_eq!(
                    self.graph.edge_endpoints(mirror),
                    Some((b, a)),
                    "edge {} mirror is not reversed",
                    id
                );
                assert_eq!(self.graph[mirror].attrs, first.attrs, "edge {} halves differ", id);
            }
        }
        assert_eq!(backing, self.graph.edge_count(), "orphaned petgraph edges");
    }
}

impl SnapshotSource for GraphStore {
    fn snapshot(&self) -> Snapshot {
        GraphStore::snapshot(self)
    }
}

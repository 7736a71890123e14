//! Stable ID newtypes for routing graph entities.
//!
//! All IDs are distinct newtype wrappers, providing type safety so that a
//! `NodeId` cannot be accidentally used where an `EdgeId` is expected.

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Dense node identifier in `0..node_count`. Maps to a petgraph `NodeIndex<u32>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Logical edge identifier allocated by the store. Never reused.
///
/// An undirected edge is one logical edge mirrored in both directions, so
/// both directions share the same `EdgeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

/// Point in time used by the temporal index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl NodeId {
    /// Returns the id as a `usize` for indexing dense tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// Display implementations -- just print the inner value.

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Bridge between NodeId and petgraph's NodeIndex<u32>.

impl From<NodeIndex<u32>> for NodeId {
    fn from(idx: NodeIndex<u32>) -> Self {
        NodeId(idx.index() as u32)
    }
}

impl From<NodeId> for NodeIndex<u32> {
    fn from(id: NodeId) -> Self {
        NodeIndex::new(id.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_to_node_index_roundtrip() {
        let idx = NodeIndex::<u32>::new(42);
        let node_id = NodeId::from(idx);
        assert_eq!(node_id.0, 42);

        let back: NodeIndex<u32> = node_id.into();
        assert_eq!(back.index(), 42);
    }

    #[test]
    fn node_ids_order_numerically() {
        let mut ids = vec![NodeId(3), NodeId(0), NodeId(2)];
        ids.sort();
        assert_eq!(ids, vec![NodeId(0), NodeId(2), NodeId(3)]);
        assert!(vec![NodeId(0), NodeId(1)] < vec![NodeId(0), NodeId(2)]);
    }

    #[test]
    fn display_prints_inner_value() {
        assert_eq!(format!("{}", NodeId(7)), "7");
        assert_eq!(format!("{}", EdgeId(99)), "99");
        assert_eq!(format!("{}", Timestamp(12)), "12");
    }

    #[test]
    fn serde_is_transparent_enough_for_protocol_output() {
        let json = serde_json::to_string(&vec![NodeId(0), NodeId(1)]).unwrap();
        assert_eq!(json, "[0,1]");
        let back: Vec<NodeId> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![NodeId(0), NodeId(1)]);
    }
}

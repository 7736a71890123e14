//! Core error types for routegraph-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Every variant
//! is a caller mistake (an invalid argument). Expected outcomes such as
//! "no path" are never errors.

use thiserror::Error;

use crate::id::NodeId;

/// Argument validation errors raised by the graph data model and stores.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A node id is outside `[0, node_count)`.
    #[error("node out of range: NodeId({id}) with node_count {node_count}", id = node.0)]
    NodeOutOfRange { node: NodeId, node_count: usize },

    /// An edge attribute failed validation (negative weight, reliability
    /// outside `(0, 1]`, NaN, ...).
    #[error("invalid edge attribute: {reason}")]
    InvalidAttribute { reason: String },

    /// The requested node count does not fit the `u32` id space.
    #[error("too many nodes: {requested} exceeds the u32 id space")]
    TooManyNodes { requested: usize },

    /// Every `u32` edge id has been handed out.
    #[error("edge id space exhausted")]
    EdgeIdsExhausted,
}

impl CoreError {
    /// Convenience constructor for [`CoreError::InvalidAttribute`].
    pub fn invalid_attribute(reason: impl Into<String>) -> Self {
        CoreError::InvalidAttribute {
            reason: reason.into(),
        }
    }
}

/// Checks that `node` is a valid id for a graph of `node_count` nodes.
pub fn check_node(node: NodeId, node_count: usize) -> Result<(), CoreError> {
    if node.index() < node_count {
        Ok(())
    } else {
        Err(CoreError::NodeOutOfRange { node, node_count })
    }
}

/// Checks that `node_count` fits the `u32` id space.
pub fn check_node_count(node_count: usize) -> Result<(), CoreError> {
    if node_count > u32::MAX as usize {
        return Err(CoreError::TooManyNodes {
            requested: node_count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_node_accepts_ids_below_count() {
        assert!(check_node(NodeId(0), 1).is_ok());
        assert!(check_node(NodeId(4), 5).is_ok());
    }

    #[test]
    fn check_node_rejects_ids_at_or_above_count() {
        match check_node(NodeId(5), 5) {
            Err(CoreError::NodeOutOfRange { node, node_count }) => {
                assert_eq!(node, NodeId(5));
                assert_eq!(node_count, 5);
            }
            other => panic!("expected NodeOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn error_messages_name_the_offender() {
        let err = CoreError::NodeOutOfRange {
            node: NodeId(9),
            node_count: 3,
        };
        assert_eq!(
            err.to_string(),
            "node out of range: NodeId(9) with node_count 3"
        );
        assert_eq!(
            CoreError::invalid_attribute("weight must be >= 0").to_string(),
            "invalid edge attribute: weight must be >= 0"
        );
    }
}

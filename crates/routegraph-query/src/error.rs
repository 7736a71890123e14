//! Query error types.
//!
//! Only caller mistakes are errors. A query that finds no route returns
//! `Ok(None)` (or an empty path / sentinel cost), never an error.

use routegraph_core::CoreError;
use thiserror::Error;

/// Errors produced by the path query engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// A node id or attribute failed validation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A constraint bound or search setting is malformed (negative budget,
    /// NaN, reliability threshold outside `[0, 1]`, zero buckets, ...).
    #[error("invalid constraint: {reason}")]
    InvalidConstraint { reason: String },

    /// The exact multi-resource search created more labels than allowed.
    #[error("label limit exceeded: more than {limit} labels")]
    LabelLimitExceeded { limit: usize },
}

impl QueryError {
    pub fn invalid_constraint(reason: impl Into<String>) -> Self {
        QueryError::InvalidConstraint {
            reason: reason.into(),
        }
    }
}

//! Path objectives.
//!
//! An objective folds edge attributes into a path score and says which of
//! two scores is better:
//!
//! | objective     | origin | extend            | better  | no-path sentinel |
//! |---------------|--------|-------------------|---------|------------------|
//! | `Weight`      | 0      | `score + weight`  | smaller | `-1.0`           |
//! | `Capacity`    | +inf   | `min(score, cap)` | larger  | `0.0`            |
//! | `Reliability` | 1      | `score * rel`     | larger  | `0.0`            |
//!
//! All three are monotone (extending a path never makes it better), which is
//! what label-setting search needs.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use routegraph_core::EdgeAttrs;

use crate::error::QueryError;

/// What a route query optimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    /// Minimize the sum of edge weights.
    #[default]
    Weight,
    /// Maximize the bottleneck (minimum) edge capacity.
    Capacity,
    /// Maximize the product of edge reliabilities.
    Reliability,
}

impl Objective {
    /// Score of the empty path.
    pub fn origin(self) -> f64 {
        Metric::from(self).origin()
    }

    /// Score of a path extended by one edge.
    pub fn extend(self, score: f64, attrs: &EdgeAttrs) -> f64 {
        Metric::from(self).extend(score, attrs)
    }

    /// `Ordering::Less` when `a` is the better score.
    pub fn compare(self, a: f64, b: f64) -> Ordering {
        Metric::from(self).compare(a, b)
    }

    /// Cost reported by `find_path_cost` when no route exists.
    pub fn unreachable_sentinel(self) -> f64 {
        match self {
            Objective::Weight => -1.0,
            Objective::Capacity | Objective::Reliability => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Objective::Weight => "weight",
            Objective::Capacity => "capacity",
            Objective::Reliability => "reliability",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Objective {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weight" => Ok(Objective::Weight),
            "capacity" => Ok(Objective::Capacity),
            "reliability" => Ok(Objective::Reliability),
            other => Err(QueryError::invalid_constraint(format!(
                "unknown objective '{}'",
                other
            ))),
        }
    }
}

/// Internal scoring rule used by the searches. Adds `Hops`, a constant
/// score that leaves ordering entirely to hop count and node order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Metric {
    Weight,
    Capacity,
    Reliability,
    Hops,
}

impl From<Objective> for Metric {
    fn from(objective: Objective) -> Self {
        match objective {
            Objective::Weight => Metric::Weight,
            Objective::Capacity => Metric::Capacity,
            Objective::Reliability => Metric::Reliability,
        }
    }
}

impl Metric {
    pub(crate) fn origin(self) -> f64 {
        match self {
            Metric::Weight | Metric::Hops => 0.0,
            Metric::Capacity => f64::INFINITY,
            Metric::Reliability => 1.0,
        }
    }

    pub(crate) fn extend(self, score: f64, attrs: &EdgeAttrs) -> f64 {
        match self {
            Metric::Weight => score + attrs.weight,
            Metric::Capacity => score.min(attrs.capacity_or_unlimited()),
            Metric::Reliability => score * attrs.reliability,
            Metric::Hops => score,
        }
    }

    /// Maps a score onto a key where smaller is always better.
    pub(crate) fn key(self, score: f64) -> f64 {
        match self {
            Metric::Weight => score,
            Metric::Capacity | Metric::Reliability => -score,
            Metric::Hops => 0.0,
        }
    }

    pub(crate) fn compare(self, a: f64, b: f64) -> Ordering {
        self.key(a).total_cmp(&self.key(b))
    }
}

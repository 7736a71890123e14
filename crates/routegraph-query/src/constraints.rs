//! Route constraints.
//!
//! `min_capacity` is a per-edge filter: edges below it are simply not
//! traversable. The other bounds are cumulative over the whole path and
//! are either settled by the objective itself (a weight budget on a
//! weight-minimizing query) or enforced by the multi-resource search.

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::objective::Objective;
use crate::route::Route;

/// Optional bounds a route must satisfy. All `None` means unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Constraints {
    /// Upper bound on total weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_weight: Option<f64>,
    /// Every traversed edge must have at least this capacity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_capacity: Option<f64>,
    /// Upper bound on total toll.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_toll: Option<f64>,
    /// Lower bound on the reliability product.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_reliability: Option<f64>,
    /// Upper bound on the number of edges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hops: Option<u32>,
}

impl Constraints {
    pub fn none() -> Self {
        Constraints::default()
    }

    pub fn with_max_weight(mut self, bound: f64) -> Self {
        self.max_weight = Some(bound);
        self
    }

    pub fn with_min_capacity(mut self, bound: f64) -> Self {
        self.min_capacity = Some(bound);
        self
    }

    pub fn with_max_toll(mut self, bound: f64) -> Self {
        self.max_toll = Some(bound);
        self
    }

    pub fn with_min_reliability(mut self, bound: f64) -> Self {
        self.min_reliability = Some(bound);
        self
    }

    pub fn with_max_hops(mut self, bound: u32) -> Self {
        self.max_hops = Some(bound);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        check_non_negative("max_weight", self.max_weight)?;
        check_non_negative("max_toll", self.max_toll)?;
        if let Some(bound) = self.min_capacity {
            if bound.is_nan() || bound < 0.0 {
                return Err(QueryError::invalid_constraint(format!(
                    "min_capacity must be >= 0, got {}",
                    bound
                )));
            }
        }
        if let Some(bound) = self.min_reliability {
            if !(0.0..=1.0).contains(&bound) {
                return Err(QueryError::invalid_constraint(format!(
                    "min_reliability must be in [0, 1], got {}",
                    bound
                )));
            }
        }
        Ok(())
    }

    /// Whether an edge with capacity `capacity` passes the per-edge filter.
    pub(crate) fn admits_capacity(&self, capacity: f64) -> bool {
        self.min_capacity.map_or(true, |bound| capacity >= bound)
    }

    /// Whether a finished route satisfies every bound.
    pub fn admits(&self, route: &Route) -> bool {
        self.max_weight.map_or(true, |b| route.weight <= b)
            && self.max_toll.map_or(true, |b| route.toll <= b)
            && self.min_reliability.map_or(true, |b| route.reliability >= b)
            && self.max_hops.map_or(true, |b| route.hops <= b)
            && self
                .min_capacity
                .map_or(true, |b| route.bottleneck.unwrap_or(f64::INFINITY) >= b)
    }

    /// Whether some cumulative bound is not already implied by optimizing
    /// `objective`, so the search has to track resources per label.
    pub(crate) fn needs_resource_search(&self, objective: Objective) -> bool {
        self.max_toll.is_some()
            || self.max_hops.is_some()
            || (self.max_weight.is_some() && objective != Objective::Weight)
            || (self.min_reliability.is_some() && objective != Objective::Reliability)
    }
}

fn check_non_negative(name: &str, bound: Option<f64>) -> Result<(), QueryError> {
    match bound {
        Some(b) if b.is_nan() || b < 0.0 => Err(QueryError::invalid_constraint(format!(
            "{} must be >= 0, got {}",
            name, b
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty_and_valid() {
        let c = Constraints::none();
        assert!(c.is_empty());
        assert!(c.validate().is_ok());
        assert!(!c.needs_resource_search(Objective::Capacity));
    }

    #[test]
    fn rejects_malformed_bounds() {
        assert!(Constraints::none().with_max_weight(-1.0).validate().is_err());
        assert!(Constraints::none().with_max_toll(f64::NAN).validate().is_err());
        assert!(Constraints::none().with_min_capacity(-0.5).validate().is_err());
        assert!(Constraints::none().with_min_reliability(1.5).validate().is_err());
        assert!(Constraints::none().with_min_reliability(0.0).validate().is_ok());
    }

    #[test]
    fn objective_implied_bounds_skip_resource_search() {
        let weight_budget = Constraints::none().with_max_weight(10.0);
        assert!(!weight_budget.needs_resource_search(Objective::Weight));
        assert!(weight_budget.needs_resource_search(Objective::Reliability));

        let reliability_floor = Constraints::none().with_min_reliability(0.5);
        assert!(!reliability_floor.needs_resource_search(Objective::Reliability));
        assert!(reliability_floor.needs_resource_search(Objective::Weight));

        let capacity_floor = Constraints::none().with_min_capacity(10.0);
        assert!(!capacity_floor.needs_resource_search(Objective::Weight));
    }
}

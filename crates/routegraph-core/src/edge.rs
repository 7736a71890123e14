//! Edge attributes and graph orientation.
//!
//! Every edge carries a primary [`weight`](EdgeAttrs::weight) plus the
//! auxiliary attributes the routing objectives and constraints read:
//! capacity (bandwidth), reliability (success probability) and toll
//! (secondary cost).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Whether an edge `(u, v)` is also traversable as `(v, u)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directedness {
    /// Edges are one-way.
    Directed,
    /// Edges are mirrored in both directions.
    #[default]
    Undirected,
}

impl Directedness {
    pub fn is_directed(self) -> bool {
        matches!(self, Directedness::Directed)
    }
}

/// Attributes of a single edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeAttrs {
    /// Latency / cost / distance. Finite and non-negative.
    pub weight: f64,
    /// Maximum throughput. `None` means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<f64>,
    /// Success probability in `(0, 1]`.
    #[serde(default = "default_reliability")]
    pub reliability: f64,
    /// Secondary cost charged for traversing the edge. Finite and non-negative.
    #[serde(default)]
    pub toll: f64,
}

fn default_reliability() -> f64 {
    1.0
}

impl EdgeAttrs {
    /// An edge with the given weight, unlimited capacity, reliability 1 and
    /// no toll.
    pub fn new(weight: f64) -> Self {
        EdgeAttrs {
            weight,
            capacity: None,
            reliability: 1.0,
            toll: 0.0,
        }
    }

    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability = reliability;
        self
    }

    pub fn with_toll(mut self, toll: f64) -> Self {
        self.toll = toll;
        self
    }

    /// Capacity as a number, with unlimited mapped to `f64::INFINITY`.
    pub fn capacity_or_unlimited(&self) -> f64 {
        self.capacity.unwrap_or(f64::INFINITY)
    }

    /// Validates every attribute.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(CoreError::invalid_attribute(format!(
                "weight must be finite and >= 0, got {}",
                self.weight
            )));
        }
        if let Some(capacity) = self.capacity {
            if capacity.is_nan() || capacity < 0.0 {
                return Err(CoreError::invalid_attribute(format!(
                    "capacity must be >= 0, got {}",
                    capacity
                )));
            }
        }
        if !(self.reliability > 0.0 && self.reliability <= 1.0) {
            return Err(CoreError::invalid_attribute(format!(
                "reliability must be in (0, 1], got {}",
                self.reliability
            )));
        }
        if !self.toll.is_finite() || self.toll < 0.0 {
            return Err(CoreError::invalid_attribute(format!(
                "toll must be finite and >= 0, got {}",
                self.toll
            )));
        }
        Ok(())
    }

    /// Secondary preference between two parallel edges whose primary
    /// contribution is equal: higher capacity, then higher reliability, then
    /// lower toll. `Ordering::Less` means `self` is preferred.
    pub fn secondary_cmp(&self, other: &EdgeAttrs) -> Ordering {
        other
            .capacity_or_unlimited()
            .total_cmp(&self.capacity_or_unlimited())
            .then_with(|| other.reliability.total_cmp(&self.reliability))
            .then_with(|| self.toll.total_cmp(&other.toll))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_edge_has_neutral_auxiliary_attributes() {
        let attrs = EdgeAttrs::new(5.0);
        assert_eq!(attrs.weight, 5.0);
        assert_eq!(attrs.capacity, None);
        assert_eq!(attrs.capacity_or_unlimited(), f64::INFINITY);
        assert_eq!(attrs.reliability, 1.0);
        assert_eq!(attrs.toll, 0.0);
        assert!(attrs.validate().is_ok());
    }

    #[test]
    fn validate_rejects_negative_weight() {
        assert!(EdgeAttrs::new(-1.0).validate().is_err());
        assert!(EdgeAttrs::new(f64::NAN).validate().is_err());
        assert!(EdgeAttrs::new(f64::INFINITY).validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_auxiliary_attributes() {
        assert!(EdgeAttrs::new(1.0).with_capacity(-3.0).validate().is_err());
        assert!(EdgeAttrs::new(1.0).with_reliability(0.0).validate().is_err());
        assert!(EdgeAttrs::new(1.0).with_reliability(1.5).validate().is_err());
        assert!(EdgeAttrs::new(1.0).with_toll(-0.5).validate().is_err());
        assert!(EdgeAttrs::new(1.0)
            .with_capacity(0.0)
            .with_reliability(1.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn secondary_preference_orders_capacity_then_reliability_then_toll() {
        let wide = EdgeAttrs::new(1.0).with_capacity(100.0);
        let narrow = EdgeAttrs::new(1.0).with_capacity(10.0);
        assert_eq!(wide.secondary_cmp(&narrow), Ordering::Less);

        let safe = EdgeAttrs::new(1.0).with_reliability(0.9);
        let risky = EdgeAttrs::new(1.0).with_reliability(0.5);
        assert_eq!(safe.secondary_cmp(&risky), Ordering::Less);

        let cheap = EdgeAttrs::new(1.0).with_toll(1.0);
        let pricey = EdgeAttrs::new(1.0).with_toll(2.0);
        assert_eq!(cheap.secondary_cmp(&pricey), Ordering::Less);
        assert_eq!(cheap.secondary_cmp(&cheap), Ordering::Equal);
    }

    #[test]
    fn missing_fields_take_defaults_when_deserialized() {
        let attrs: EdgeAttrs = serde_json::from_str(r#"{"weight": 2.5}"#).unwrap();
        assert_eq!(attrs, EdgeAttrs::new(2.5));
    }

    #[test]
    fn directedness_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Directedness::Directed).unwrap(),
            "\"directed\""
        );
        assert_eq!(Directedness::default(), Directedness::Undirected);
    }
}

use serde::{Deserialize, Serialize};

use super::numeric::lenient_number;

/// One comparable unit (a brand or a category) observed at two time points.
///
/// Every numeric field is optional: the dashboard feeds server aggregates
/// straight through, and `null` means "no data" rather than zero. Strings
/// holding numbers are accepted; anything unparseable reads as missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(alias = "brand")]
    pub id: String,
    #[serde(default, alias = "base_sum", deserialize_with = "lenient_number")]
    pub base: Option<f64>,
    #[serde(default, alias = "current_sum", deserialize_with = "lenient_number")]
    pub current: Option<f64>,
    #[serde(default, alias = "delta_sum", deserialize_with = "lenient_number")]
    pub delta: Option<f64>,
}

impl EntityRecord {
    pub fn new(
        id: impl Into<String>,
        base: Option<f64>,
        current: Option<f64>,
        delta: Option<f64>,
    ) -> Self {
        Self { id: id.into(), base, current, delta }
    }
}

/// Normalized metrics for one entity. All fields are finite; `base` and
/// `current` are never negative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricBundle {
    pub id: String,
    /// Clamped base value (A).
    pub base: f64,
    /// Clamped current value (B).
    pub current: f64,
    /// Signed delta (D).
    pub delta: f64,
    /// Percentage change of B over A.
    pub pct: f64,
    /// Delta relative to base size (D / A).
    pub eff: f64,
}

impl MetricBundle {
    pub fn is_zero(&self) -> bool {
        self.base == 0.0 && self.current == 0.0 && self.delta == 0.0
    }
}

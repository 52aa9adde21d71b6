use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::numeric::lenient_number;

/// Relative index value of the base period.
pub const BASE_INDEX: f64 = 100.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryMetric {
    #[serde(default, deserialize_with = "lenient_number")]
    pub sum: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub index: Option<f64>,
}

impl CategoryMetric {
    pub fn new(sum: f64, index: Option<f64>) -> Self {
        Self { sum: Some(sum), index }
    }
}

/// One period of a category time series.
///
/// Serialized flat, the way the trends API returns it:
/// `{ "date": "2025-09-04", "크림": { "sum": 120, "index": 104.2 } }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodPoint {
    pub date: String,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, CategoryMetric>,
}

impl PeriodPoint {
    pub fn new(date: impl Into<String>) -> Self {
        Self { date: date.into(), metrics: BTreeMap::new() }
    }

    pub fn with_metric(mut self, category: impl Into<String>, metric: CategoryMetric) -> Self {
        self.metrics.insert(category.into(), metric);
        self
    }

    /// Sum for a category; missing or non-finite values read as zero.
    pub fn sum_of(&self, category: &str) -> f64 {
        self.metrics
            .get(category)
            .and_then(|metric| metric.sum)
            .filter(|value| value.is_finite())
            .unwrap_or(0.0)
    }

    /// Relative index for a category; missing or non-finite values read as the base index.
    pub fn index_of(&self, category: &str) -> f64 {
        self.metrics
            .get(category)
            .and_then(|metric| metric.index)
            .filter(|value| value.is_finite())
            .unwrap_or(BASE_INDEX)
    }
}

/// A labelled value in a categorical composition snapshot (donut chart).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub label: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub value: Option<f64>,
}

impl Slice {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self { label: label.into(), value: Some(value) }
    }

    pub fn amount(&self) -> f64 {
        self.value.filter(|value| value.is_finite()).unwrap_or(0.0)
    }
}

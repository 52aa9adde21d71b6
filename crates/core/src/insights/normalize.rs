//! Metric normalization.
//!
//! Turns raw entity records into finite metric bundles. Missing, NaN or
//! negative inputs collapse to zero instead of failing, so downstream ranking
//! never compares against NaN or infinity.

use crate::domain::metrics::{EntityRecord, MetricBundle};

pub fn normalize(record: &EntityRecord) -> MetricBundle {
    let base = clamp_non_negative(record.base);
    let current = clamp_non_negative(record.current);
    let delta = record.delta.filter(|value| value.is_finite()).unwrap_or(0.0);

    let pct = if base > 0.0 {
        (current / base - 1.0) * 100.0
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    };

    // Efficiency is undefined without a base; emerging entities are picked up
    // by the segment rules instead.
    let eff = if base > 0.0 { delta / base } else { 0.0 };

    MetricBundle {
        id: record.id.clone(),
        base,
        current,
        delta,
        pct: finite_or_zero(pct),
        eff: finite_or_zero(eff),
    }
}

pub fn normalize_all(records: &[EntityRecord]) -> Vec<MetricBundle> {
    records.iter().map(normalize).collect()
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn clamp_non_negative(value: Option<f64>) -> f64 {
    // `f64::max` returns the non-NaN operand, but infinities still need filtering.
    finite_or_zero(value.unwrap_or(0.0)).max(0.0)
}

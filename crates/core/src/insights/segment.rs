//! Percentile segmentation of entities by base size.

use serde::{Deserialize, Serialize};

use crate::domain::metrics::MetricBundle;

/// Quantile used for the "emerging" boundary.
pub const MEDIAN_QUANTILE: f64 = 0.5;
/// Quantile used for the "established" boundary.
pub const UPPER_QUARTILE: f64 = 0.75;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Segments {
    pub median: f64,
    pub q75: f64,
}

impl Segments {
    /// Large-base tier: `A >= q75`.
    pub fn is_established(&self, bundle: &MetricBundle) -> bool {
        bundle.base >= self.q75
    }

    /// Small-base tier: `A < median`.
    pub fn is_emerging(&self, bundle: &MetricBundle) -> bool {
        bundle.base < self.median
    }
}

pub fn segment(bundles: &[MetricBundle]) -> Segments {
    let mut bases: Vec<f64> = bundles.iter().map(|bundle| bundle.base).collect();
    bases.sort_by(|left, right| left.total_cmp(right));

    Segments {
        median: nearest_rank(&bases, MEDIAN_QUANTILE),
        q75: nearest_rank(&bases, UPPER_QUARTILE),
    }
}

/// Largest-base entity of the established tier (ties by id).
pub fn established_leader<'a>(
    bundles: &'a [MetricBundle],
    segments: &Segments,
) -> Option<&'a MetricBundle> {
    bundles.iter().filter(|bundle| segments.is_established(bundle)).min_by(|left, right| {
        right.base.total_cmp(&left.base).then_with(|| left.id.cmp(&right.id))
    })
}

/// Floor-indexed sample quantile over ascending `sorted` values; no interpolation.
fn nearest_rank(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let last = sorted.len() - 1;
    let position = (q * last as f64).floor();
    let index = if position <= 0.0 { 0 } else { (position as usize).min(last) };
    sorted[index]
}

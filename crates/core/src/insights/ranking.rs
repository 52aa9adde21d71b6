//! Rule-ordered entity selection.
//!
//! Rules run in a fixed priority order. Each rule picks its single best
//! candidate; the pick is dropped when an earlier rule already selected the
//! same entity. The set of used ids is threaded forward as a fold so no entity
//! appears under more than one rule.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::metrics::MetricBundle;
use crate::insights::segment::Segments;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    TopByDelta,
    TopInLargeSegment,
    TopByEfficiency,
    TopInEmergingSegment,
    TopDecline,
}

impl RuleId {
    /// Evaluation and display order.
    pub const PRIORITY: [RuleId; 5] = [
        RuleId::TopByDelta,
        RuleId::TopInLargeSegment,
        RuleId::TopByEfficiency,
        RuleId::TopInEmergingSegment,
        RuleId::TopDecline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopByDelta => "top-by-delta",
            Self::TopInLargeSegment => "top-in-large-segment",
            Self::TopByEfficiency => "top-by-efficiency",
            Self::TopInEmergingSegment => "top-in-emerging-segment",
            Self::TopDecline => "top-decline",
        }
    }

    /// Best candidate for this rule, ignoring whether it was already used.
    pub fn pick<'a>(
        &self,
        bundles: &'a [MetricBundle],
        segments: &Segments,
    ) -> Option<&'a MetricBundle> {
        match self {
            Self::TopByDelta => bundles.iter().min_by(|l, r| by_delta_desc(l, r)),
            Self::TopInLargeSegment => bundles
                .iter()
                .filter(|bundle| segments.is_established(bundle))
                .min_by(|l, r| by_delta_desc(l, r)),
            Self::TopByEfficiency => bundles
                .iter()
                .filter(|bundle| bundle.delta > 0.0 && bundle.base > 0.0)
                .min_by(|l, r| by_eff_desc(l, r)),
            Self::TopInEmergingSegment => bundles
                .iter()
                .filter(|bundle| segments.is_emerging(bundle))
                .min_by(|l, r| by_delta_desc(l, r)),
            Self::TopDecline => bundles
                .iter()
                .min_by(|l, r| by_delta_asc(l, r))
                .filter(|bundle| bundle.delta < 0.0),
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedSelection {
    pub rule: RuleId,
    pub bundle: MetricBundle,
}

pub fn select(bundles: &[MetricBundle], segments: &Segments) -> Vec<RankedSelection> {
    let (selections, _used) = RuleId::PRIORITY.iter().fold(
        (Vec::new(), BTreeSet::<&str>::new()),
        |(mut selections, mut used), rule| {
            if let Some(pick) = rule.pick(bundles, segments) {
                if used.insert(pick.id.as_str()) {
                    selections.push(RankedSelection { rule: *rule, bundle: pick.clone() });
                }
            }
            (selections, used)
        },
    );
    selections
}

/// Top gainers and decliners for the A/B compare view.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodMovers {
    /// Largest positive deltas, descending.
    pub top: Vec<MetricBundle>,
    /// Most negative deltas, ascending.
    pub bottom: Vec<MetricBundle>,
}

pub fn compare_periods(bundles: &[MetricBundle], limit: usize) -> PeriodMovers {
    let mut gainers: Vec<&MetricBundle> = bundles.iter().filter(|b| b.delta > 0.0).collect();
    gainers.sort_by(|l, r| by_delta_desc(l, r));

    let mut decliners: Vec<&MetricBundle> = bundles.iter().filter(|b| b.delta < 0.0).collect();
    decliners.sort_by(|l, r| by_delta_asc(l, r));

    PeriodMovers {
        top: gainers.into_iter().take(limit).cloned().collect(),
        bottom: decliners.into_iter().take(limit).cloned().collect(),
    }
}

fn by_delta_desc(left: &MetricBundle, right: &MetricBundle) -> Ordering {
    right.delta.total_cmp(&left.delta).then_with(|| left.id.cmp(&right.id))
}

fn by_delta_asc(left: &MetricBundle, right: &MetricBundle) -> Ordering {
    left.delta.total_cmp(&right.delta).then_with(|| left.id.cmp(&right.id))
}

fn by_eff_desc(left: &MetricBundle, right: &MetricBundle) -> Ordering {
    right.eff.total_cmp(&left.eff).then_with(|| left.id.cmp(&right.id))
}

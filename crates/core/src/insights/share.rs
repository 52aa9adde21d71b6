//! Share-of-total comparison for categorical snapshots and category overlays.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::series::{PeriodPoint, Slice};
use crate::insights::window::trim_window;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShareRow {
    pub label: String,
    pub current: f64,
    pub current_share: f64,
    pub previous: f64,
    pub previous_share: f64,
    /// Current value minus previous value.
    pub delta: f64,
    /// Current share minus previous share, in percentage points.
    pub share_delta_pp: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShareMove {
    pub label: String,
    pub share_delta_pp: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShareComparison {
    pub current_total: f64,
    /// Present only when a previous snapshot was supplied.
    pub previous_total: Option<f64>,
    pub top_by_share: ShareRow,
    pub top_by_delta: ShareRow,
    /// Rows sorted by current share, largest first.
    pub rows: Vec<ShareRow>,
    pub biggest_gain: Option<ShareMove>,
    pub biggest_loss: Option<ShareMove>,
}

impl ShareComparison {
    /// Percentage-point change of the share leader, when a previous snapshot exists.
    pub fn top_share_change_pp(&self) -> Option<f64> {
        self.previous_total.map(|_| self.top_by_share.share_delta_pp)
    }
}

/// Compares a current composition snapshot against an optional previous one.
///
/// Previous values are matched by label; labels missing from `previous` count
/// as zero. Returns `None` when `current` is empty.
pub fn compare_shares(current: &[Slice], previous: Option<&[Slice]>) -> Option<ShareComparison> {
    if current.is_empty() {
        return None;
    }

    let current_total: f64 = current.iter().map(Slice::amount).sum();
    let previous_total: Option<f64> =
        previous.map(|slices| slices.iter().map(Slice::amount).sum());

    let previous_values: BTreeMap<&str, f64> = previous
        .unwrap_or_default()
        .iter()
        .map(|slice| (slice.label.as_str(), slice.amount()))
        .collect();

    let rows: Vec<ShareRow> = current
        .iter()
        .map(|slice| {
            let value = slice.amount();
            let prior = previous_values.get(slice.label.as_str()).copied().unwrap_or(0.0);
            let current_share = share_of(value, current_total);
            let previous_share = share_of(prior, previous_total.unwrap_or(0.0));
            ShareRow {
                label: slice.label.clone(),
                current: value,
                current_share,
                previous: prior,
                previous_share,
                delta: value - prior,
                share_delta_pp: current_share - previous_share,
            }
        })
        .collect();

    let top_by_share = rows
        .iter()
        .min_by(|l, r| r.current_share.total_cmp(&l.current_share).then_with(|| by_label(l, r)))?
        .clone();
    let top_by_delta = rows
        .iter()
        .min_by(|l, r| r.delta.total_cmp(&l.delta).then_with(|| by_label(l, r)))?
        .clone();

    let has_previous = previous.is_some_and(|slices| !slices.is_empty());
    let (biggest_gain, biggest_loss) = if has_previous {
        let gain = rows.iter().min_by(|l, r| {
            r.share_delta_pp.total_cmp(&l.share_delta_pp).then_with(|| by_label(l, r))
        });
        let loss = rows.iter().min_by(|l, r| {
            l.share_delta_pp.total_cmp(&r.share_delta_pp).then_with(|| by_label(l, r))
        });
        (gain.map(share_move), loss.map(share_move))
    } else {
        (None, None)
    };

    let mut sorted = rows;
    sorted.sort_by(|l, r| r.current_share.total_cmp(&l.current_share).then_with(|| by_label(l, r)));

    tracing::debug!(
        event_name = "insights.share.compared",
        slices = sorted.len(),
        has_previous,
        "share comparison computed"
    );

    Some(ShareComparison {
        current_total,
        previous_total,
        top_by_share,
        top_by_delta,
        rows: sorted,
        biggest_gain,
        biggest_loss,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayRow {
    pub category: String,
    pub base_sum: f64,
    pub current_sum: f64,
    /// Growth contribution, clamped at zero.
    pub delta_sum: f64,
    pub base_index: f64,
    pub current_index: f64,
    /// Signed index change.
    pub delta_index: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlaySummary {
    pub from_date: String,
    pub to_date: String,
    pub rows: Vec<OverlayRow>,
    pub top_contributor: Option<String>,
}

/// Base-to-latest summary of a window-trimmed category series.
pub fn summarize_overlay(
    series: &[PeriodPoint],
    categories: &[String],
    window: usize,
) -> Option<OverlaySummary> {
    if series.is_empty() || categories.is_empty() {
        return None;
    }
    let slice = trim_window(series, window);
    let (first, last) = (slice.first()?, slice.last()?);

    let rows: Vec<OverlayRow> = categories
        .iter()
        .map(|category| {
            let base_sum = first.sum_of(category);
            let current_sum = last.sum_of(category);
            let base_index = first.index_of(category);
            let current_index = last.index_of(category);
            OverlayRow {
                category: category.clone(),
                base_sum,
                current_sum,
                delta_sum: (current_sum - base_sum).max(0.0),
                base_index,
                current_index,
                delta_index: current_index - base_index,
            }
        })
        .collect();

    let top_contributor = rows
        .iter()
        .min_by(|l, r| {
            r.delta_sum.total_cmp(&l.delta_sum).then_with(|| l.category.cmp(&r.category))
        })
        .map(|row| row.category.clone());

    tracing::debug!(
        event_name = "insights.overlay.summarized",
        points = slice.len(),
        categories = rows.len(),
        "overlay summary computed"
    );

    Some(OverlaySummary {
        from_date: first.date.clone(),
        to_date: last.date.clone(),
        rows,
        top_contributor,
    })
}

/// Donut snapshots derived from a category series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeeklyDonut {
    /// Date of the selected week.
    pub date: String,
    /// Growth of the selected week over the week before.
    pub current: Vec<Slice>,
    /// Growth of the week before, present only when two earlier weeks exist.
    pub previous: Option<Vec<Slice>>,
}

/// Turns a category series into donut slices of week-over-week growth,
/// `max(0, sum(week) - sum(week before))` per category.
///
/// The selected week is the one dated `date`, or the latest week when `date`
/// is absent or not in the series. A selected week without a predecessor has
/// no current slices. Returns `None` for an empty series.
pub fn donut_from_series(
    series: &[PeriodPoint],
    categories: &[String],
    date: Option<&str>,
) -> Option<WeeklyDonut> {
    let mut sorted: Vec<&PeriodPoint> = series.iter().collect();
    sorted.sort_by(|left, right| left.date.cmp(&right.date));
    let latest = sorted.len().checked_sub(1)?;
    let selected = date
        .and_then(|date| sorted.iter().position(|point| point.date == date))
        .unwrap_or(latest);

    let growth = |at: usize| -> Option<Vec<Slice>> {
        let before = sorted.get(at.checked_sub(1)?)?;
        let point = sorted.get(at)?;
        let slices = categories
            .iter()
            .map(|category| {
                let gained = (point.sum_of(category) - before.sum_of(category)).max(0.0);
                Slice::new(category.clone(), gained)
            })
            .collect();
        Some(slices)
    };

    let current = growth(selected).unwrap_or_default();
    let previous = selected.checked_sub(1).and_then(growth);

    tracing::debug!(
        event_name = "insights.donut.derived",
        selected,
        slices = current.len(),
        has_previous = previous.is_some(),
        "donut slices derived from series"
    );

    Some(WeeklyDonut { date: sorted.get(selected)?.date.clone(), current, previous })
}

fn share_of(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total * 100.0
    } else {
        0.0
    }
}

fn share_move(row: &ShareRow) -> ShareMove {
    ShareMove { label: row.label.clone(), share_delta_pp: row.share_delta_pp }
}

fn by_label(left: &ShareRow, right: &ShareRow) -> Ordering {
    left.label.cmp(&right.label)
}

//! Rolling-window trimming and volatility analysis over category series.

use std::cmp::Ordering;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::domain::series::{PeriodPoint, BASE_INDEX};
use crate::format::Formatter;

/// Date-ascending suffix of a series, at most `window` points long.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowSlice {
    pub points: Vec<PeriodPoint>,
}

impl WindowSlice {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PeriodPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PeriodPoint> {
        self.points.last()
    }

    pub fn sums(&self, category: &str) -> Vec<f64> {
        self.points.iter().map(|point| point.sum_of(category)).collect()
    }
}

pub fn trim_window(series: &[PeriodPoint], window: usize) -> WindowSlice {
    let mut sorted = series.to_vec();
    // stable: equal dates keep input order
    sorted.sort_by(|left, right| left.date.cmp(&right.date));
    let start = sorted.len().saturating_sub(window);
    WindowSlice { points: sorted.split_off(start) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    /// Mean of squared period-over-period differences.
    pub variance: f64,
    /// Last value minus first value across the window.
    pub net_delta: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowAnalysis {
    pub window: WindowSlice,
    pub stats: Vec<CategoryStats>,
    pub volatile: Option<String>,
    pub rising_top2: Vec<String>,
    pub flattest: Option<String>,
}

pub fn analyze_window(
    series: &[PeriodPoint],
    categories: &[String],
    window: usize,
) -> WindowAnalysis {
    let slice = trim_window(series, window);
    let stats: Vec<CategoryStats> =
        categories.iter().map(|category| category_stats(&slice, category)).collect();

    let volatile = stats
        .iter()
        .min_by(|l, r| r.variance.total_cmp(&l.variance).then_with(|| by_name(l, r)))
        .map(|stat| stat.category.clone());

    let mut rising: Vec<&CategoryStats> = stats.iter().collect();
    rising.sort_by(|l, r| r.net_delta.total_cmp(&l.net_delta).then_with(|| by_name(l, r)));
    let rising_top2 = rising.into_iter().take(2).map(|stat| stat.category.clone()).collect();

    let flattest = stats
        .iter()
        .min_by(|l, r| l.net_delta.abs().total_cmp(&r.net_delta.abs()).then_with(|| by_name(l, r)))
        .map(|stat| stat.category.clone());

    tracing::debug!(
        event_name = "insights.window.analyzed",
        points = slice.len(),
        categories = stats.len(),
        "window analysis computed"
    );

    WindowAnalysis { window: slice, stats, volatile, rising_top2, flattest }
}

fn category_stats(slice: &WindowSlice, category: &str) -> CategoryStats {
    let values = slice.sums(category);
    let diffs: Vec<f64> = values.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let squared: f64 = diffs.iter().map(|diff| diff * diff).sum();
    let variance = squared / diffs.len().max(1) as f64;

    let net_delta = match (values.first(), values.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    };

    CategoryStats { category: category.to_string(), variance, net_delta }
}

fn by_name(left: &CategoryStats, right: &CategoryStats) -> Ordering {
    left.category.cmp(&right.category)
}

/// Fills missing relative indices as `sum / first_sum * 100` per category.
///
/// Returns the series sorted by date. A category whose first sum is not
/// positive gets the base index everywhere it is missing.
pub fn rebase_index(series: &[PeriodPoint], categories: &[String]) -> Vec<PeriodPoint> {
    let mut sorted = series.to_vec();
    sorted.sort_by(|left, right| left.date.cmp(&right.date));

    for category in categories {
        let first_sum = sorted.first().map(|point| point.sum_of(category)).unwrap_or(0.0);
        for point in &mut sorted {
            let sum = point.sum_of(category);
            let metric = point.metrics.entry(category.clone()).or_default();
            if metric.index.filter(|value| value.is_finite()).is_some() {
                continue;
            }
            let index = if first_sum > 0.0 { sum / first_sum * BASE_INDEX } else { BASE_INDEX };
            metric.index = Some(index);
        }
    }

    sorted
}

/// Positions within the slice whose date falls on `anchor`.
pub fn anchor_positions(
    slice: &WindowSlice,
    anchor: Weekday,
    formatter: &dyn Formatter,
) -> Vec<usize> {
    slice
        .points
        .iter()
        .enumerate()
        .filter_map(|(position, point)| {
            let date = formatter.parse_date(&point.date)?;
            (formatter.weekday_of(date) == anchor).then_some(position)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::{analyze_window, anchor_positions, rebase_index, trim_window};
    use crate::domain::series::{CategoryMetric, PeriodPoint};
    use crate::format::KoreanFormatter;

    fn point(date: &str, values: &[(&str, f64)]) -> PeriodPoint {
        values.iter().fold(PeriodPoint::new(date), |point, (category, sum)| {
            point.with_metric(*category, CategoryMetric::new(*sum, None))
        })
    }

    fn categories(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn trims_to_date_sorted_suffix() {
        let series = vec![
            point("2025-09-25", &[]),
            point("2025-09-04", &[]),
            point("2025-09-18", &[]),
            point("2025-09-11", &[]),
        ];
        let slice = trim_window(&series, 2);
        let dates: Vec<&str> = slice.points.iter().map(|p| p.date.as_str()).collect();

        assert_eq!(dates, vec!["2025-09-18", "2025-09-25"]);
    }

    #[test]
    fn short_series_keeps_every_point() {
        let series = vec![point("2025-09-04", &[]), point("2025-09-11", &[])];
        assert_eq!(trim_window(&series, 8).len(), 2);
        assert_eq!(trim_window(&series, 0).len(), 0);
    }

    #[test]
    fn variance_uses_successive_differences() {
        let series = vec![
            point("2025-09-04", &[("스킨", 10.0)]),
            point("2025-09-11", &[("스킨", 12.0)]),
            point("2025-09-18", &[("스킨", 11.0)]),
            point("2025-09-25", &[("스킨", 20.0)]),
        ];
        let analysis = analyze_window(&series, &categories(&["스킨"]), 4);
        let stat = &analysis.stats[0];

        assert!((stat.variance - 86.0 / 3.0).abs() < 1e-9);
        assert_eq!(stat.net_delta, 10.0);
    }

    #[test]
    fn single_point_window_has_zero_variance() {
        let series = vec![point("2025-09-04", &[("크림", 50.0)])];
        let analysis = analyze_window(&series, &categories(&["크림"]), 8);

        assert_eq!(analysis.stats[0].variance, 0.0);
        assert_eq!(analysis.stats[0].net_delta, 0.0);
    }

    #[test]
    fn picks_volatile_rising_and_flattest_categories() {
        let series = vec![
            point("2025-09-04", &[("a", 0.0), ("b", 100.0), ("c", 10.0)]),
            point("2025-09-11", &[("a", 50.0), ("b", 110.0), ("c", 11.0)]),
            point("2025-09-18", &[("a", 5.0), ("b", 120.0), ("c", 12.0)]),
            point("2025-09-25", &[("a", 30.0), ("b", 130.0), ("c", 10.0)]),
        ];
        let analysis = analyze_window(&series, &categories(&["a", "b", "c"]), 8);

        assert_eq!(analysis.volatile.as_deref(), Some("a"));
        assert_eq!(analysis.rising_top2, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(analysis.flattest.as_deref(), Some("c"));
    }

    #[test]
    fn missing_category_values_read_as_zero() {
        let series = vec![point("2025-09-04", &[("a", 5.0)]), point("2025-09-11", &[])];
        let analysis = analyze_window(&series, &categories(&["a"]), 8);

        assert_eq!(analysis.stats[0].net_delta, -5.0);
    }

    #[test]
    fn variance_ties_break_by_category_name() {
        let series = vec![
            point("2025-09-04", &[("z", 0.0), ("m", 0.0)]),
            point("2025-09-11", &[("z", 4.0), ("m", 4.0)]),
        ];
        let analysis = analyze_window(&series, &categories(&["z", "m"]), 8);

        assert_eq!(analysis.volatile.as_deref(), Some("m"));
    }

    #[test]
    fn empty_categories_produce_no_picks() {
        let series = vec![point("2025-09-04", &[("a", 1.0)])];
        let analysis = analyze_window(&series, &[], 8);

        assert!(analysis.volatile.is_none());
        assert!(analysis.rising_top2.is_empty());
        assert!(analysis.flattest.is_none());
    }

    #[test]
    fn rebase_fills_only_missing_indices() {
        let series = vec![
            point("2025-09-11", &[("a", 150.0)]),
            point("2025-09-04", &[("a", 100.0)])
                .with_metric("b", CategoryMetric { sum: Some(0.0), index: Some(87.5) }),
        ];
        let rebased = rebase_index(&series, &categories(&["a", "b"]));

        assert_eq!(rebased[0].date, "2025-09-04");
        assert_eq!(rebased[0].index_of("a"), 100.0);
        assert_eq!(rebased[1].index_of("a"), 150.0);
        assert_eq!(rebased[0].index_of("b"), 87.5);
        assert_eq!(rebased[1].index_of("b"), 100.0);
    }

    #[test]
    fn anchor_positions_match_weekday_and_skip_bad_dates() {
        // 2025-09-04 and 2025-09-11 are Thursdays
        let series = vec![
            point("2025-09-04", &[]),
            point("2025-09-06", &[]),
            point("2025-09-11T00:00:00Z", &[]),
            point("not-a-date", &[]),
        ];
        let slice = trim_window(&series, 8);
        let formatter = KoreanFormatter::default();
        let positions = anchor_positions(&slice, Weekday::Thu, &formatter);

        let dates: Vec<&str> = positions.iter().map(|i| slice.points[*i].date.as_str()).collect();
        assert_eq!(dates, vec!["2025-09-04", "2025-09-11T00:00:00Z"]);
    }
}

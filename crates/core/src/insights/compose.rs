//! Caption composition.
//!
//! Binds engine outputs to the dashboard's ko-KR caption templates. Counts and
//! percentages go through the injected [`Formatter`]. Percentage points, index
//! changes and A/B percent changes use fixed one-decimal notation.

use crate::config::EngineConfig;
use crate::domain::caption::{
    BubbleCaption, Caption, CaptionBullet, Headline, NoSignalReason, Tone,
};
use crate::domain::metrics::{EntityRecord, MetricBundle};
use crate::domain::series::{PeriodPoint, Slice};
use crate::format::Formatter;
use crate::insights::normalize::normalize_all;
use crate::insights::ranking::{compare_periods, select, RankedSelection, RuleId};
use crate::insights::segment::{established_leader, segment};
use crate::insights::share::{compare_shares, summarize_overlay};
use crate::insights::window::analyze_window;

pub const DEFAULT_MAX_LINES: usize = 4;
pub const DEFAULT_WINDOW: usize = 8;

const EMPTY_MESSAGE: &str =
    "이번 주엔 유의미한 변화가 적어요. 다음 주에 다시 확인해 주세요.";
const PLACEHOLDER: &str = "—";

pub struct CaptionComposer<'a> {
    formatter: &'a dyn Formatter,
    max_lines: usize,
    window: usize,
    period_label: Option<String>,
}

impl<'a> CaptionComposer<'a> {
    pub fn new(formatter: &'a dyn Formatter) -> Self {
        Self { formatter, max_lines: DEFAULT_MAX_LINES, window: DEFAULT_WINDOW, period_label: None }
    }

    pub fn from_config(formatter: &'a dyn Formatter, config: &EngineConfig) -> Self {
        Self::new(formatter)
            .with_max_lines(config.max_lines)
            .with_window(config.window)
            .with_period_label(config.period_label.clone())
    }

    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_period_label(mut self, period_label: Option<String>) -> Self {
        self.period_label = period_label.filter(|label| !label.trim().is_empty());
        self
    }

    // -----------------------------------------------------------------------
    // Bubble chart
    // -----------------------------------------------------------------------

    pub fn compose_bubble(&self, records: &[EntityRecord]) -> BubbleCaption {
        if records.is_empty() {
            tracing::debug!(event_name = "insights.bubble.no_signal", reason = "empty");
            return BubbleCaption::NoSignal {
                reason: NoSignalReason::Empty,
                message: EMPTY_MESSAGE.to_string(),
            };
        }

        let bundles = normalize_all(records);
        if bundles.iter().all(MetricBundle::is_zero) {
            tracing::debug!(
                event_name = "insights.bubble.no_signal",
                reason = "all_zero",
                records = records.len()
            );
            return BubbleCaption::NoSignal {
                reason: NoSignalReason::AllZero,
                message: format!("변화가 거의 없었습니다{}.", self.period_suffix()),
            };
        }

        let segments = segment(&bundles);
        let selections = select(&bundles, &segments);

        let rising = selections
            .iter()
            .find(|selection| selection.rule == RuleId::TopByDelta)
            .map(|selection| selection.bundle.id.clone());
        let established =
            established_leader(&bundles, &segments).map(|bundle| bundle.id.clone());
        let headline = (rising.is_some() || established.is_some())
            .then_some(Headline { rising, established });

        let bullets = self.compose(&selections);

        tracing::debug!(
            event_name = "insights.bubble.composed",
            records = records.len(),
            selections = selections.len(),
            bullets = bullets.len(),
            "bubble caption composed"
        );

        BubbleCaption::Insights {
            guide: format!(
                "읽는 법 · X축은 누적 리뷰 수(A), Y축은 이번 주 증가(Δ)예요. \
                 오른쪽일수록 규모, 위로 갈수록 급상승입니다{}.",
                self.period_suffix()
            ),
            headline,
            bullets,
        }
    }

    /// Renders rule selections in priority order, truncated to the line budget.
    pub fn compose(&self, selections: &[RankedSelection]) -> Vec<CaptionBullet> {
        selections
            .iter()
            .take(self.max_lines)
            .map(|selection| self.render_selection(selection))
            .collect()
    }

    fn render_selection(&self, selection: &RankedSelection) -> CaptionBullet {
        let f = self.formatter;
        let b = &selection.bundle;
        let (text, tone) = match selection.rule {
            RuleId::TopByDelta => (
                format!(
                    "이번 주 절대 증가 1위는 {} (Δ {}, A {} → B {}, {}).",
                    b.id,
                    f.format_number(b.delta),
                    f.format_number(b.base),
                    f.format_number(b.current),
                    f.percent(b.pct)
                ),
                Tone::Highlight,
            ),
            RuleId::TopInLargeSegment => (
                format!(
                    "대규모 집단(A 상위 25%)에선 {}가 가장 많이 늘었어요 (Δ {}).",
                    b.id,
                    f.format_number(b.delta)
                ),
                Tone::Positive,
            ),
            RuleId::TopByEfficiency => (
                format!(
                    "증가 효율(Δ/A) 기준에선 {}가 두드러집니다 (Δ {} / A {}).",
                    b.id,
                    f.format_number(b.delta),
                    f.format_number(b.base)
                ),
                Tone::Positive,
            ),
            RuleId::TopInEmergingSegment => (
                format!("신흥 강자로는 {}에 주목! 규모는 작지만 이번 주 급상승.", b.id),
                Tone::Positive,
            ),
            RuleId::TopDecline => (
                format!(
                    "감소 폭이 큰 브랜드는 {} (Δ {}, A {} → B {}).",
                    b.id,
                    f.format_number(b.delta),
                    f.format_number(b.base),
                    f.format_number(b.current)
                ),
                Tone::Negative,
            ),
        };
        CaptionBullet::new(selection.rule.as_str(), text, tone)
    }

    // -----------------------------------------------------------------------
    // Donut chart
    // -----------------------------------------------------------------------

    pub fn compose_donut(
        &self,
        current: &[Slice],
        previous: Option<&[Slice]>,
        week_label: Option<&str>,
    ) -> Option<Caption> {
        let comparison = compare_shares(current, previous)?;
        let f = self.formatter;

        let lead = week_label
            .filter(|label| !label.trim().is_empty())
            .map(|label| format!("{label} 기준, "))
            .unwrap_or_default();
        let title = format!(
            "{lead}이번 주 새로 늘어난 리뷰를 파이로 나눠 보여줘요. \
             조각이 클수록 이번 주 기여도가 큰 거예요."
        );

        let mut lines = Vec::new();

        let previous_total = comparison
            .previous_total
            .map(|total| format!(" (지난주 {})", f.format_number(total)))
            .unwrap_or_default();
        lines.push(CaptionBullet::new(
            "total",
            format!(
                "이번 주 증가 합계 {}{previous_total}.",
                f.format_number(comparison.current_total)
            ),
            Tone::Neutral,
        ));

        let leader = &comparison.top_by_share;
        let leader_change = comparison
            .top_share_change_pp()
            .map(|pp| format!(" / 전주 대비 {}", signed_pp(pp)))
            .unwrap_or_default();
        lines.push(CaptionBullet::new(
            "share-leader",
            format!(
                "가장 큰 몫: {} ({}){leader_change}.",
                leader.label,
                f.format_percent(leader.current_share, 1)
            ),
            Tone::Highlight,
        ));

        let mover = &comparison.top_by_delta;
        lines.push(CaptionBullet::new(
            "delta-leader",
            format!(
                "이번 주에 가장 많이 늘어난 곳: {} ({}).",
                mover.label,
                self.signed_number(mover.delta)
            ),
            tone_of(mover.delta),
        ));

        match (&comparison.biggest_gain, &comparison.biggest_loss) {
            (Some(gain), Some(loss)) => lines.push(CaptionBullet::new(
                "share-movers",
                format!(
                    "직전 주 대비 변화: {} {} · {} {}",
                    gain.label,
                    signed_pp(gain.share_delta_pp),
                    loss.label,
                    signed_pp(loss.share_delta_pp)
                ),
                Tone::Neutral,
            )),
            _ => lines.push(CaptionBullet::new(
                "no-previous",
                "직전 주 데이터가 없어 변화 비교는 생략했어요.",
                Tone::Neutral,
            )),
        }

        let has_previous = comparison.previous_total.is_some();
        for row in &comparison.rows {
            let mut text = format!(
                "{} {} • {}",
                row.label,
                self.signed_number(row.delta),
                f.format_percent(row.current_share, 1)
            );
            if has_previous {
                let arrow = match row.share_delta_pp {
                    pp if pp > 0.0 => '↑',
                    pp if pp < 0.0 => '↓',
                    _ => '→',
                };
                text.push_str(&format!(" {arrow} {:.1}pp", row.share_delta_pp.abs()));
            }
            let tone = if has_previous { tone_of(row.share_delta_pp) } else { Tone::Neutral };
            lines.push(CaptionBullet::new("share-row", text, tone));
        }

        Some(Caption { title: Some(title), lines })
    }

    // -----------------------------------------------------------------------
    // Category overlay and small multiples
    // -----------------------------------------------------------------------

    pub fn compose_overlay(
        &self,
        series: &[PeriodPoint],
        categories: &[String],
    ) -> Option<Caption> {
        let summary = summarize_overlay(series, categories, self.window)?;
        let f = self.formatter;

        let title = format!(
            "선이 위로 갈수록 최근까지 더 많이 늘었다는 뜻이에요. ({} → {})",
            summary.from_date, summary.to_date
        );

        let latest = summary
            .rows
            .iter()
            .map(|row| {
                format!("{} {}", row.category, f.format_number(row.current_sum.round()))
            })
            .collect::<Vec<_>>()
            .join(", ");
        let changes = summary
            .rows
            .iter()
            .map(|row| {
                let sign = if row.delta_index >= 0.0 { "+" } else { "" };
                format!(
                    "{} +{} / {sign}{:.1}",
                    row.category,
                    f.format_number(row.delta_sum.round()),
                    row.delta_index
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut lines = vec![
            CaptionBullet::new(
                "latest-sums",
                format!("최신 주 합계: {latest}"),
                Tone::Neutral,
            ),
            CaptionBullet::new(
                "changes",
                format!("변화(베이스→최신): {changes}"),
                Tone::Neutral,
            ),
        ];
        if let Some(top) = summary.top_contributor {
            lines.push(CaptionBullet::new(
                "top-contributor",
                format!("가장 많이 오른 카테고리: {top}"),
                Tone::Highlight,
            ));
        }

        Some(Caption { title: Some(title), lines })
    }

    pub fn compose_small_multiples(
        &self,
        series: &[PeriodPoint],
        categories: &[String],
    ) -> Option<Caption> {
        if series.is_empty() || categories.is_empty() {
            return None;
        }
        let analysis = analyze_window(series, categories, self.window);

        let rising = if analysis.rising_top2.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            analysis.rising_top2.join(", ")
        };
        let lines = vec![
            CaptionBullet::new(
                "volatile-rising",
                format!(
                    "가장 들썩: {} · 가파른 상승: {rising}",
                    analysis.volatile.as_deref().unwrap_or(PLACEHOLDER)
                ),
                Tone::Highlight,
            ),
            CaptionBullet::new(
                "flattest",
                format!(
                    "잔잔한 카테고리: {}",
                    analysis.flattest.as_deref().unwrap_or(PLACEHOLDER)
                ),
                Tone::Neutral,
            ),
        ];

        Some(Caption { title: Some(format!("최근 {}주 흐름 요약", self.window)), lines })
    }

    // -----------------------------------------------------------------------
    // A/B compare
    // -----------------------------------------------------------------------

    pub fn compose_compare(&self, a_date: &str, b_date: &str, records: &[EntityRecord]) -> Caption {
        let movers = compare_periods(&normalize_all(records), 1);

        let mut lines = vec![CaptionBullet::new(
            "basis",
            format!("기준: A={a_date} → B={b_date} (Δ = B−A)"),
            Tone::Neutral,
        )];
        if let Some(top) = movers.top.first() {
            lines.push(CaptionBullet::new(
                "top-gainer",
                format!("가장 오른 브랜드: {} ({})", top.id, self.delta_with_pct(top)),
                Tone::Positive,
            ));
        }
        if let Some(bottom) = movers.bottom.first() {
            lines.push(CaptionBullet::new(
                "top-decliner",
                format!("가장 빠진 브랜드: {} ({})", bottom.id, self.delta_with_pct(bottom)),
                Tone::Negative,
            ));
        }

        tracing::debug!(
            event_name = "insights.compare.composed",
            records = records.len(),
            lines = lines.len(),
            "compare caption composed"
        );

        Caption { title: Some("이번 주 A/B 비교".to_string()), lines }
    }

    fn delta_with_pct(&self, bundle: &MetricBundle) -> String {
        let sign = if bundle.pct >= 0.0 { "+" } else { "" };
        format!("Δ {}, {sign}{:.1}%", self.formatter.format_number(bundle.delta), bundle.pct)
    }

    fn signed_number(&self, value: f64) -> String {
        let sign = if value >= 0.0 { "+" } else { "" };
        format!("{sign}{}", self.formatter.format_number(value))
    }

    fn period_suffix(&self) -> String {
        self.period_label.as_deref().map(|label| format!(" · {label}")).unwrap_or_default()
    }
}

fn signed_pp(value: f64) -> String {
    let sign = if value >= 0.0 { "+" } else { "" };
    format!("{sign}{value:.1}pp")
}

fn tone_of(value: f64) -> Tone {
    if value > 0.0 {
        Tone::Positive
    } else if value < 0.0 {
        Tone::Negative
    } else {
        Tone::Neutral
    }
}

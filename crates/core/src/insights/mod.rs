//! Insight engine for trend-chart captions.
//!
//! Every stage is a pure function over plain data: records are normalized,
//! segmented by base size, ranked through an ordered rule pipeline and
//! finally bound to caption templates by [`compose::CaptionComposer`].

pub mod compose;
pub mod normalize;
pub mod ranking;
pub mod segment;
pub mod share;
pub mod window;

pub use compose::CaptionComposer;
pub use normalize::{normalize, normalize_all};
pub use ranking::{compare_periods, select, PeriodMovers, RankedSelection, RuleId};
pub use segment::{established_leader, segment, Segments};
pub use share::{
    compare_shares, donut_from_series, summarize_overlay, OverlaySummary, ShareComparison,
    WeeklyDonut,
};
pub use window::{
    analyze_window, anchor_positions, rebase_index, trim_window, WindowAnalysis, WindowSlice,
};

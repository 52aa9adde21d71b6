pub mod config;
pub mod domain;
pub mod errors;
pub mod format;
pub mod ingest;
pub mod insights;

pub use config::{AppConfig, ConfigError, ConfigOverrides, EngineConfig, LoadOptions, LogFormat};
pub use domain::caption::{BubbleCaption, Caption, CaptionBullet, Headline, NoSignalReason, Tone};
pub use domain::metrics::{EntityRecord, MetricBundle};
pub use domain::series::{CategoryMetric, PeriodPoint, Slice};
pub use errors::{ApplicationError, InputError};
pub use format::{Formatter, KoreanFormatter};
pub use ingest::{ChartInput, ChartKind};
pub use insights::CaptionComposer;

use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use trendcap_core::config::{AppConfig, ConfigError, ConfigOverrides, EngineConfig, LoadOptions};
use trendcap_core::errors::ApplicationError;
use trendcap_core::format::{Formatter, KoreanFormatter};
use trendcap_core::ingest::{self, ChartInput, ChartKind, SeriesInput};
use trendcap_core::insights::window::{anchor_positions, rebase_index, trim_window};
use trendcap_core::insights::CaptionComposer;

use crate::commands::CommandResult;

#[derive(Clone, Debug, Default)]
pub struct CaptionRequest {
    pub input: PathBuf,
    pub config_path: Option<PathBuf>,
    pub plain: bool,
    pub overrides: ConfigOverrides,
}

pub fn load_config(request: &CaptionRequest) -> Result<AppConfig, ConfigError> {
    AppConfig::load(LoadOptions {
        config_path: request.config_path.clone(),
        require_file: request.config_path.is_some(),
        overrides: request.overrides.clone(),
    })
}

/// Captions one chart input. `None` reads the chart kind from the input's `chart` field.
pub fn run(kind: Option<ChartKind>, request: &CaptionRequest) -> CommandResult {
    run_with_config(kind, request, load_config(request))
}

/// Same as [`run`] with the configuration already loaded by the caller.
pub fn run_with_config(
    kind: Option<ChartKind>,
    request: &CaptionRequest,
    config: Result<AppConfig, ConfigError>,
) -> CommandResult {
    let command = kind.map(|kind| kind.as_str()).unwrap_or("render");

    let rendered = match execute(kind, request, config) {
        Ok(rendered) => rendered,
        Err(error) => {
            tracing::warn!(
                event_name = "cli.caption.failed",
                command,
                error_class = error.error_class(),
                "caption command failed"
            );
            return CommandResult::failure(
                command,
                error.error_class(),
                format!("{} ({error})", error.user_message()),
                error.exit_code(),
            );
        }
    };

    if request.plain {
        return CommandResult::plain(rendered.lines);
    }

    match rendered.payload {
        Some(payload) => match payload {
            Ok(caption) => CommandResult::captioned(
                command,
                rendered.summary,
                Some(caption),
                rendered.anchor_dates,
            ),
            Err(error) => {
                CommandResult::failure(command, "serialization", format!("{error:#}"), 5)
            }
        },
        None => CommandResult::success(command, rendered.summary),
    }
}

struct Rendered {
    summary: String,
    lines: Vec<String>,
    payload: Option<anyhow::Result<serde_json::Value>>,
    anchor_dates: Option<Vec<String>>,
}

fn execute(
    kind: Option<ChartKind>,
    request: &CaptionRequest,
    config: Result<AppConfig, ConfigError>,
) -> Result<Rendered, ApplicationError> {
    let config = config?;

    let input = match kind {
        Some(kind) => ingest::read_chart(kind, &request.input)?,
        None => ingest::read_tagged_chart(&request.input)?,
    };

    let formatter = KoreanFormatter::new(config.engine.percent_digits);
    Ok(render(input, &config.engine, &formatter))
}

fn render(input: ChartInput, engine: &EngineConfig, formatter: &dyn Formatter) -> Rendered {
    match input {
        ChartInput::Bubble(bubble) => {
            let label = bubble.period_label.or_else(|| engine.period_label.clone());
            let composer = CaptionComposer::from_config(formatter, engine).with_period_label(label);
            let caption = composer.compose_bubble(&bubble.records);
            let summary = if caption.is_no_signal() {
                format!("no signal in {} records", bubble.records.len())
            } else {
                format!("{} bullets from {} records", caption.bullets().len(), bubble.records.len())
            };
            Rendered {
                summary,
                lines: caption.texts(),
                payload: Some(to_payload(&caption)),
                anchor_dates: None,
            }
        }
        ChartInput::Donut(donut) => {
            let donut = donut.with_derived_slices();
            let caption = CaptionComposer::from_config(formatter, engine).compose_donut(
                &donut.current,
                donut.prev.as_deref(),
                donut.week_label.as_deref(),
            );
            let summary = format!("{} slices", donut.current.len());
            optional(caption, summary, None)
        }
        ChartInput::Overlay(series) => {
            let anchors = anchor_dates(&series, engine, formatter);
            let rebased = rebase_index(&series.series, &series.categories);
            let caption = CaptionComposer::from_config(formatter, engine)
                .compose_overlay(&rebased, &series.categories);
            optional(caption, series_summary(&series), Some(anchors))
        }
        ChartInput::Multiples(series) => {
            let anchors = anchor_dates(&series, engine, formatter);
            let caption = CaptionComposer::from_config(formatter, engine)
                .compose_small_multiples(&series.series, &series.categories);
            optional(caption, series_summary(&series), Some(anchors))
        }
        ChartInput::Compare(compare) => {
            let caption = CaptionComposer::from_config(formatter, engine).compose_compare(
                &compare.a_date,
                &compare.b_date,
                &compare.records,
            );
            let summary = format!("{} records compared", compare.records.len());
            optional(Some(caption), summary, None)
        }
    }
}

fn optional(
    caption: Option<trendcap_core::Caption>,
    summary: String,
    anchor_dates: Option<Vec<String>>,
) -> Rendered {
    match caption {
        Some(caption) => Rendered {
            summary,
            lines: caption.texts(),
            payload: Some(to_payload(&caption)),
            anchor_dates,
        },
        None => {
            let summary = format!("no caption: {summary}");
            Rendered { lines: vec![summary.clone()], summary, payload: None, anchor_dates }
        }
    }
}

fn series_summary(series: &SeriesInput) -> String {
    format!("{} periods, {} categories", series.series.len(), series.categories.len())
}

fn anchor_dates(
    series: &SeriesInput,
    engine: &EngineConfig,
    formatter: &dyn Formatter,
) -> Vec<String> {
    let slice = trim_window(&series.series, engine.window);
    anchor_positions(&slice, engine.anchor(), formatter)
        .into_iter()
        .filter_map(|position| slice.points.get(position).map(|point| point.date.clone()))
        .collect()
}

fn to_payload<T: Serialize>(caption: &T) -> anyhow::Result<serde_json::Value> {
    serde_json::to_value(caption).context("caption could not be serialized")
}

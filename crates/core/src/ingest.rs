//! Chart input files.
//!
//! Each chart kind has its own JSON shape. Field names follow the trends API
//! (`brand`, `base_sum`, ...) with the engine's own names accepted as aliases.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::from_value;

use crate::domain::metrics::EntityRecord;
use crate::domain::series::{PeriodPoint, Slice};
use crate::errors::InputError;
use crate::insights::share::donut_from_series;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bubble,
    Donut,
    Overlay,
    Multiples,
    Compare,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bubble => "bubble",
            Self::Donut => "donut",
            Self::Overlay => "overlay",
            Self::Multiples => "multiples",
            Self::Compare => "compare",
        }
    }
}

impl std::str::FromStr for ChartKind {
    type Err = InputError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bubble" => Ok(Self::Bubble),
            "donut" => Ok(Self::Donut),
            "overlay" => Ok(Self::Overlay),
            "multiples" | "small_multiples" => Ok(Self::Multiples),
            "compare" | "ab" => Ok(Self::Compare),
            other => Err(InputError::UnsupportedChart(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BubbleInput {
    #[serde(default)]
    pub period_label: Option<String>,
    #[serde(default)]
    pub records: Vec<EntityRecord>,
}

/// Donut input: precomputed slices, or a category series to derive them from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DonutInput {
    #[serde(default)]
    pub week_label: Option<String>,
    #[serde(default)]
    pub current: Vec<Slice>,
    #[serde(default, alias = "previous")]
    pub prev: Option<Vec<Slice>>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub series: Vec<PeriodPoint>,
    /// Selected week in `series`; the latest week when unset.
    #[serde(default)]
    pub date: Option<String>,
}

impl DonutInput {
    /// Fills `current` and `prev` from `series` when no slices were given.
    /// The selected week's date becomes the label unless one was supplied.
    pub fn with_derived_slices(mut self) -> Self {
        if !self.current.is_empty() {
            return self;
        }
        let Some(weekly) = donut_from_series(&self.series, &self.categories, self.date.as_deref())
        else {
            return self;
        };
        self.current = weekly.current;
        self.prev = weekly.previous;
        self.week_label = self.week_label.or(Some(weekly.date));
        self
    }
}

/// Input for both the overlay and the small-multiples charts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesInput {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub series: Vec<PeriodPoint>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompareInput {
    pub a_date: String,
    pub b_date: String,
    #[serde(default)]
    pub records: Vec<EntityRecord>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChartInput {
    Bubble(BubbleInput),
    Donut(DonutInput),
    Overlay(SeriesInput),
    Multiples(SeriesInput),
    Compare(CompareInput),
}

impl ChartInput {
    pub fn kind(&self) -> ChartKind {
        match self {
            Self::Bubble(_) => ChartKind::Bubble,
            Self::Donut(_) => ChartKind::Donut,
            Self::Overlay(_) => ChartKind::Overlay,
            Self::Multiples(_) => ChartKind::Multiples,
            Self::Compare(_) => ChartKind::Compare,
        }
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| InputError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw)
        .map_err(|source| InputError::Parse { path: path.to_path_buf(), source })
}

pub fn read_chart(kind: ChartKind, path: &Path) -> Result<ChartInput, InputError> {
    Ok(match kind {
        ChartKind::Bubble => ChartInput::Bubble(read_json(path)?),
        ChartKind::Donut => ChartInput::Donut(read_json(path)?),
        ChartKind::Overlay => ChartInput::Overlay(read_json(path)?),
        ChartKind::Multiples => ChartInput::Multiples(read_json(path)?),
        ChartKind::Compare => ChartInput::Compare(read_json(path)?),
    })
}

/// Reads a self-describing input whose top-level `chart` field names its kind.
pub fn read_tagged_chart(path: &Path) -> Result<ChartInput, InputError> {
    let value: serde_json::Value = read_json(path)?;
    let tag = value.get("chart").and_then(serde_json::Value::as_str).unwrap_or_default();
    let kind: ChartKind = tag.parse()?;

    let parse = |source| InputError::Parse { path: path.to_path_buf(), source };
    Ok(match kind {
        ChartKind::Bubble => ChartInput::Bubble(from_value(value).map_err(parse)?),
        ChartKind::Donut => ChartInput::Donut(from_value(value).map_err(parse)?),
        ChartKind::Overlay => ChartInput::Overlay(from_value(value).map_err(parse)?),
        ChartKind::Multiples => ChartInput::Multiples(from_value(value).map_err(parse)?),
        ChartKind::Compare => ChartInput::Compare(from_value(value).map_err(parse)?),
    })
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::weekday_from_sunday_index;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Trailing periods kept by the window trimmer.
    pub window: usize,
    /// Bubble chart bullet budget.
    pub max_lines: usize,
    pub percent_digits: usize,
    /// Sunday-based weekday index used for anchor ticks.
    pub anchor_weekday: u8,
    pub period_label: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub window: Option<usize>,
    pub max_lines: Option<usize>,
    pub period_label: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("`{path}` line {line}: `${{{var}}}` is unset and has no `:-` fallback")]
    MissingEnvInterpolation { var: String, path: PathBuf, line: usize },
    #[error("`{path}` line {line}: `${{` is not closed on the same line")]
    UnterminatedInterpolation { path: PathBuf, line: usize },
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                window: 8,
                max_lines: 4,
                percent_digits: 1,
                anchor_weekday: 4,
                period_label: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl EngineConfig {
    pub fn anchor(&self) -> Weekday {
        weekday_from_sunday_index(self.anchor_weekday).unwrap_or(Weekday::Thu)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("trendcap.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(engine) = patch.engine {
            if let Some(window) = engine.window {
                self.engine.window = window;
            }
            if let Some(max_lines) = engine.max_lines {
                self.engine.max_lines = max_lines;
            }
            if let Some(percent_digits) = engine.percent_digits {
                self.engine.percent_digits = percent_digits;
            }
            if let Some(anchor_weekday) = engine.anchor_weekday {
                self.engine.anchor_weekday = anchor_weekday;
            }
            if let Some(period_label) = engine.period_label {
                self.engine.period_label = Some(period_label);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TRENDCAP_ENGINE_WINDOW") {
            self.engine.window = parse_usize("TRENDCAP_ENGINE_WINDOW", &value)?;
        }
        if let Some(value) = read_env("TRENDCAP_ENGINE_MAX_LINES") {
            self.engine.max_lines = parse_usize("TRENDCAP_ENGINE_MAX_LINES", &value)?;
        }
        if let Some(value) = read_env("TRENDCAP_ENGINE_PERCENT_DIGITS") {
            self.engine.percent_digits = parse_usize("TRENDCAP_ENGINE_PERCENT_DIGITS", &value)?;
        }
        if let Some(value) = read_env("TRENDCAP_ENGINE_ANCHOR_WEEKDAY") {
            self.engine.anchor_weekday = parse_u8("TRENDCAP_ENGINE_ANCHOR_WEEKDAY", &value)?;
        }
        if let Some(value) = read_env("TRENDCAP_ENGINE_PERIOD_LABEL") {
            self.engine.period_label = Some(value);
        }

        let log_level =
            read_env("TRENDCAP_LOGGING_LEVEL").or_else(|| read_env("TRENDCAP_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TRENDCAP_LOGGING_FORMAT").or_else(|| read_env("TRENDCAP_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(window) = overrides.window {
            self.engine.window = window;
        }
        if let Some(max_lines) = overrides.max_lines {
            self.engine.max_lines = max_lines;
        }
        if let Some(period_label) = overrides.period_label {
            self.engine.period_label = Some(period_label);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_engine(&self.engine)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("trendcap.toml"), PathBuf::from("config/trendcap.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw, path)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Expands `${VAR}` and `${VAR:-fallback}` references, one line at a time.
/// The fallback applies when `VAR` is unset or blank.
fn interpolate_env_vars(raw: &str, path: &Path) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(raw.len());

    for (index, line) in raw.split_inclusive('\n').enumerate() {
        let line_number = index + 1;
        let mut rest = line;
        while let Some(start) = rest.find("${") {
            output.push_str(&rest[..start]);
            let reference = &rest[start + 2..];
            let Some(end) = reference.find('}') else {
                return Err(ConfigError::UnterminatedInterpolation {
                    path: path.to_path_buf(),
                    line: line_number,
                });
            };
            output.push_str(&resolve_reference(&reference[..end], path, line_number)?);
            rest = &reference[end + 1..];
        }
        output.push_str(rest);
    }

    Ok(output)
}

fn resolve_reference(reference: &str, path: &Path, line: usize) -> Result<String, ConfigError> {
    let (var, fallback) = match reference.split_once(":-") {
        Some((var, fallback)) => (var.trim(), Some(fallback)),
        None => (reference.trim(), None),
    };

    match fallback {
        Some(fallback) => Ok(read_env(var).unwrap_or_else(|| fallback.to_string())),
        None => env::var(var).map_err(|_| ConfigError::MissingEnvInterpolation {
            var: var.to_string(),
            path: path.to_path_buf(),
            line,
        }),
    }
}

fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    if engine.window == 0 || engine.window > 104 {
        return Err(ConfigError::Validation("engine.window must be in range 1..=104".to_string()));
    }

    if engine.max_lines == 0 || engine.max_lines > 10 {
        return Err(ConfigError::Validation(
            "engine.max_lines must be in range 1..=10".to_string(),
        ));
    }

    if engine.percent_digits > 4 {
        return Err(ConfigError::Validation(
            "engine.percent_digits must be in range 0..=4".to_string(),
        ));
    }

    if weekday_from_sunday_index(engine.anchor_weekday).is_none() {
        return Err(ConfigError::Validation(
            "engine.anchor_weekday must be in range 0..=6 (0 = Sunday)".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u8(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.trim().parse::<u8>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    engine: Option<EnginePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    window: Option<usize>,
    max_lines: Option<usize>,
    percent_digits: Option<usize>,
    anchor_weekday: Option<u8>,
    period_label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

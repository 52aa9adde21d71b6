use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use toml::Value;
use trendcap_core::config::{AppConfig, LoadOptions};

pub fn run(config_path: Option<PathBuf>) -> String {
    let config = match AppConfig::load(LoadOptions {
        config_path: config_path.clone(),
        require_file: config_path.is_some(),
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = config_path.or_else(detect_config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "engine.window",
        &config.engine.window.to_string(),
        source("engine.window", &["TRENDCAP_ENGINE_WINDOW"]),
    ));
    lines.push(render_line(
        "engine.max_lines",
        &config.engine.max_lines.to_string(),
        source("engine.max_lines", &["TRENDCAP_ENGINE_MAX_LINES"]),
    ));
    lines.push(render_line(
        "engine.percent_digits",
        &config.engine.percent_digits.to_string(),
        source("engine.percent_digits", &["TRENDCAP_ENGINE_PERCENT_DIGITS"]),
    ));
    lines.push(render_line(
        "engine.anchor_weekday",
        &format!("{} ({})", config.engine.anchor_weekday, config.engine.anchor()),
        source("engine.anchor_weekday", &["TRENDCAP_ENGINE_ANCHOR_WEEKDAY"]),
    ));
    lines.push(render_line(
        "engine.period_label",
        config.engine.period_label.as_deref().unwrap_or("<unset>"),
        source("engine.period_label", &["TRENDCAP_ENGINE_PERIOD_LABEL"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["TRENDCAP_LOGGING_LEVEL", "TRENDCAP_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["TRENDCAP_LOGGING_FORMAT", "TRENDCAP_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("trendcap.toml"), PathBuf::from("config/trendcap.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let env_hit = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = env_hit {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

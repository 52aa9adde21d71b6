use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use tempfile::TempDir;
use trendcap_cli::commands::caption::{self, CaptionRequest};
use trendcap_cli::commands::config;
use trendcap_core::config::{AppConfig, ConfigOverrides};
use trendcap_core::ingest::ChartKind;

const WEEKLY_BRANDS: &str = r#"{
    "period_label": "9월 2주차",
    "records": [
        { "brand": "A", "base_sum": 100, "current_sum": 150, "delta_sum": 50 },
        { "brand": "B", "base_sum": 10, "current_sum": 40, "delta_sum": 30 }
    ]
}"#;

#[test]
fn bubble_returns_ranked_bullets() {
    with_env(&[], || {
        let (_dir, input) = write_input("bubble.json", WEEKLY_BRANDS);
        let result = caption::run(Some(ChartKind::Bubble), &request(input));
        assert_eq!(result.exit_code, 0, "expected successful bubble caption");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "bubble");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["caption"]["kind"], "insights");
        assert_eq!(payload["caption"]["bullets"][0]["rule_id"], "top-by-delta");
        assert_eq!(payload["caption"]["bullets"][1]["rule_id"], "top-by-efficiency");
        assert_eq!(payload["caption"]["headline"]["rising"], "A");
    });
}

#[test]
fn bubble_all_zero_input_reports_no_signal() {
    with_env(&[], || {
        let (_dir, input) = write_input(
            "flat.json",
            r#"{
                "period_label": "9월 2주차",
                "records": [{ "brand": "X", "base_sum": 0, "current_sum": 0, "delta_sum": 0 }]
            }"#,
        );
        let result = caption::run(Some(ChartKind::Bubble), &request(input));
        assert_eq!(result.exit_code, 0, "flat input is not an error");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["caption"]["kind"], "no_signal");
        assert_eq!(payload["caption"]["reason"], "all_zero");
        assert_eq!(payload["caption"]["message"], "변화가 거의 없었습니다 · 9월 2주차.");
    });
}

#[test]
fn bullet_budget_comes_from_env() {
    with_env(&[("TRENDCAP_ENGINE_MAX_LINES", "1")], || {
        let (_dir, input) = write_input("bubble.json", WEEKLY_BRANDS);
        let result = caption::run(Some(ChartKind::Bubble), &request(input));

        let payload = parse_payload(&result.output);
        let bullets = payload["caption"]["bullets"].as_array().cloned().unwrap_or_default();
        assert_eq!(bullets.len(), 1);
    });
}

#[test]
fn invalid_config_returns_config_failure() {
    with_env(&[("TRENDCAP_ENGINE_MAX_LINES", "0")], || {
        let (_dir, input) = write_input("bubble.json", WEEKLY_BRANDS);
        let result = caption::run(Some(ChartKind::Bubble), &request(input));
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
        assert!(payload["caption"].is_null());
    });
}

#[test]
fn malformed_numbers_degrade_to_a_caption() {
    with_env(&[], || {
        let (_dir, input) = write_input(
            "bubble.json",
            r#"{
                "period_label": "9월 2주차",
                "records": [
                    { "brand": "A", "base_sum": "100", "current_sum": "150", "delta_sum": "50" },
                    { "brand": "B", "base_sum": 10, "current_sum": 1e400, "delta_sum": "n/a" }
                ]
            }"#,
        );
        let result = caption::run(Some(ChartKind::Bubble), &request(input));
        assert_eq!(result.exit_code, 0, "malformed numbers must not fail the command");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["caption"]["kind"], "insights");
        assert_eq!(payload["caption"]["headline"]["rising"], "A");
    });
}

#[test]
fn missing_input_returns_read_failure() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let result =
            caption::run(Some(ChartKind::Donut), &request(dir.path().join("absent.json")));
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "donut");
        assert_eq!(payload["error_class"], "input_read");
    });
}

#[test]
fn malformed_input_returns_parse_failure() {
    with_env(&[], || {
        let (_dir, input) = write_input("broken.json", "{ \"records\": [");
        let result = caption::run(Some(ChartKind::Bubble), &request(input));
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "input_parse");
    });
}

#[test]
fn donut_plain_output_lists_caption_lines() {
    with_env(&[], || {
        let (_dir, input) = write_input(
            "donut.json",
            r#"{
                "week_label": "9월 2주차",
                "current": [{ "label": "스킨", "value": 60 }, { "label": "크림", "value": 40 }],
                "prev": [{ "label": "스킨", "value": 50 }, { "label": "크림", "value": 50 }]
            }"#,
        );
        let result = caption::run(
            Some(ChartKind::Donut),
            &CaptionRequest { plain: true, ..request(input) },
        );
        assert_eq!(result.exit_code, 0);

        assert!(result.output.contains("가장 큰 몫: 스킨 (60.0%) / 전주 대비 +10.0pp."));
        assert!(result.output.contains("직전 주 대비 변화: 스킨 +10.0pp · 크림 -10.0pp"));
    });
}

#[test]
fn donut_derives_slices_from_series() {
    with_env(&[], || {
        let (_dir, input) = write_input(
            "donut.json",
            r#"{
                "categories": ["스킨", "크림"],
                "series": [
                    { "date": "2025-09-04", "스킨": { "sum": 100 }, "크림": { "sum": 100 } },
                    { "date": "2025-09-11", "스킨": { "sum": 150 }, "크림": { "sum": 150 } },
                    { "date": "2025-09-18", "스킨": { "sum": 210 }, "크림": { "sum": 190 } }
                ]
            }"#,
        );
        let result = caption::run(
            Some(ChartKind::Donut),
            &CaptionRequest { plain: true, ..request(input) },
        );
        assert_eq!(result.exit_code, 0);

        assert!(result.output.contains("2025-09-18 기준, "));
        assert!(result.output.contains("가장 큰 몫: 스킨 (60.0%) / 전주 대비 +10.0pp."));
    });
}

#[test]
fn donut_series_without_earlier_week_has_no_caption() {
    with_env(&[], || {
        let (_dir, input) = write_input(
            "donut.json",
            r#"{
                "categories": ["스킨"],
                "series": [{ "date": "2025-09-04", "스킨": { "sum": 100 } }]
            }"#,
        );
        let result = caption::run(Some(ChartKind::Donut), &request(input));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        assert!(payload["caption"].is_null());
    });
}

#[test]
fn overlay_reports_anchor_dates() {
    with_env(&[], || {
        let (_dir, input) = write_input(
            "overlay.json",
            r#"{
                "categories": ["크림"],
                "series": [
                    { "date": "2025-09-04", "크림": { "sum": 100 } },
                    { "date": "2025-09-08", "크림": { "sum": 110 } },
                    { "date": "2025-09-11", "크림": { "sum": 150 } }
                ]
            }"#,
        );
        let result = caption::run(Some(ChartKind::Overlay), &request(input));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["anchor_dates"], serde_json::json!(["2025-09-04", "2025-09-11"]));
        let changes = payload["caption"]["lines"][1]["text"].as_str().unwrap_or_default();
        assert_eq!(changes, "변화(베이스→최신): 크림 +50 / +50.0");
    });
}

#[test]
fn empty_series_returns_no_caption() {
    with_env(&[], || {
        let (_dir, input) =
            write_input("multiples.json", r#"{ "categories": ["a"], "series": [] }"#);
        let result = caption::run(Some(ChartKind::Multiples), &request(input));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        assert!(payload["caption"].is_null());
    });
}

#[test]
fn render_rejects_unknown_chart_kind() {
    with_env(&[], || {
        let (_dir, input) = write_input("line.json", r#"{ "chart": "line", "series": [] }"#);
        let result = caption::run(None, &request(input));
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "render");
        assert_eq!(payload["error_class"], "unsupported_chart");
    });
}

#[test]
fn render_dispatches_compare_input() {
    with_env(&[], || {
        let (_dir, input) = write_input(
            "compare.json",
            r#"{
                "chart": "compare",
                "a_date": "2025-09-04",
                "b_date": "2025-09-11",
                "records": [
                    { "brand": "up", "base_sum": 100, "current_sum": 125, "delta_sum": 25 },
                    { "brand": "down", "base_sum": 200, "current_sum": 150, "delta_sum": -50 }
                ]
            }"#,
        );
        let result = caption::run(None, &CaptionRequest { plain: true, ..request(input) });

        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("가장 오른 브랜드: up (Δ 25, +25.0%)"));
        assert!(result.output.contains("가장 빠진 브랜드: down (Δ -50, -25.0%)"));
    });
}

#[test]
fn overrides_win_over_env() {
    with_env(&[("TRENDCAP_ENGINE_MAX_LINES", "1")], || {
        let (_dir, input) = write_input("bubble.json", WEEKLY_BRANDS);
        let result = caption::run(
            Some(ChartKind::Bubble),
            &CaptionRequest {
                overrides: ConfigOverrides { max_lines: Some(4), ..ConfigOverrides::default() },
                ..request(input)
            },
        );

        let payload = parse_payload(&result.output);
        let bullets = payload["caption"]["bullets"].as_array().cloned().unwrap_or_default();
        assert_eq!(bullets.len(), 2);
    });
}

#[test]
fn invalid_log_level_override_is_a_config_failure() {
    with_env(&[], || {
        let (_dir, input) = write_input("bubble.json", WEEKLY_BRANDS);
        let result = caption::run(
            Some(ChartKind::Bubble),
            &CaptionRequest {
                overrides: ConfigOverrides {
                    log_level: Some("verbose".to_string()),
                    ..ConfigOverrides::default()
                },
                ..request(input)
            },
        );
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn preloaded_config_is_used_as_given() {
    with_env(&[("TRENDCAP_ENGINE_MAX_LINES", "4")], || {
        let (_dir, input) = write_input("bubble.json", WEEKLY_BRANDS);
        let mut config = AppConfig::default();
        config.engine.max_lines = 1;

        let result = caption::run_with_config(Some(ChartKind::Bubble), &request(input), Ok(config));

        let payload = parse_payload(&result.output);
        let bullets = payload["caption"]["bullets"].as_array().cloned().unwrap_or_default();
        assert_eq!(bullets.len(), 1);
    });
}

#[test]
fn config_reports_env_and_default_sources() {
    with_env(&[("TRENDCAP_ENGINE_WINDOW", "12"), ("TRENDCAP_LOG_LEVEL", "debug")], || {
        let output = config::run(None);

        assert!(output.contains("- engine.window = 12 (source: env (TRENDCAP_ENGINE_WINDOW))"));
        assert!(output.contains("- engine.max_lines = 4 (source: default)"));
        assert!(output.contains("- logging.level = debug (source: env (TRENDCAP_LOG_LEVEL))"));
    });
}

#[test]
fn config_reports_file_source() {
    with_env(&[], || {
        let (_dir, path) = write_input("trendcap.toml", "[engine]\nmax_lines = 3\n");
        let output = config::run(Some(path.clone()));

        let expected = format!("- engine.max_lines = 3 (source: file ({}))", path.display());
        assert!(output.contains(&expected));
    });
}

fn request(input: PathBuf) -> CaptionRequest {
    CaptionRequest { input, ..CaptionRequest::default() }
}

fn write_input(name: &str, body: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join(name);
    fs::write(&path, body).expect("write input file");
    (dir, path)
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "TRENDCAP_ENGINE_WINDOW",
        "TRENDCAP_ENGINE_MAX_LINES",
        "TRENDCAP_ENGINE_PERCENT_DIGITS",
        "TRENDCAP_ENGINE_ANCHOR_WEEKDAY",
        "TRENDCAP_ENGINE_PERIOD_LABEL",
        "TRENDCAP_LOGGING_LEVEL",
        "TRENDCAP_LOGGING_FORMAT",
        "TRENDCAP_LOG_LEVEL",
        "TRENDCAP_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}

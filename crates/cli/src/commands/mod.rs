pub mod caption;
pub mod config;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    caption: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    anchor_dates: Option<Vec<String>>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::captioned(command, message, None, None)
    }

    pub fn captioned(
        command: &str,
        message: impl Into<String>,
        caption: Option<serde_json::Value>,
        anchor_dates: Option<Vec<String>>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            caption,
            anchor_dates,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    /// Human-readable output, one caption line per row.
    pub fn plain(lines: Vec<String>) -> Self {
        Self { exit_code: 0, output: lines.join("\n") }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            caption: None,
            anchor_dates: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\",\"caption\":null}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

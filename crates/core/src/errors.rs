use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("could not read input file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse input file `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("unsupported chart kind `{0}` (expected bubble|donut|overlay|multiples|compare)")]
    UnsupportedChart(String),
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Input(#[from] InputError),
}

impl ApplicationError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_validation",
            Self::Input(InputError::Read { .. }) => "input_read",
            Self::Input(InputError::Parse { .. }) => "input_parse",
            Self::Input(InputError::UnsupportedChart(_)) => "unsupported_chart",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Input(InputError::Read { .. }) => 3,
            Self::Input(InputError::Parse { .. } | InputError::UnsupportedChart(_)) => 4,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Config(_) => {
                "Configuration is invalid. Check trendcap.toml and TRENDCAP_* variables."
            }
            Self::Input(InputError::Read { .. }) => "The input file could not be read.",
            Self::Input(InputError::Parse { .. }) => {
                "The input file is not valid chart JSON. Check the field names and types."
            }
            Self::Input(InputError::UnsupportedChart(_)) => {
                "The input names a chart kind this tool does not caption."
            }
        }
    }
}

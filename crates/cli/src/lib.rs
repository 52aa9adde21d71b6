pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use trendcap_core::config::{AppConfig, ConfigOverrides, LogFormat};
use trendcap_core::ingest::ChartKind;

use crate::commands::caption::CaptionRequest;

#[derive(Debug, Parser)]
#[command(
    name = "trendcap",
    about = "Trend chart caption generator",
    long_about = "Read chart input JSON, rank what moved, and print the ko-KR caption lines \
                  the dashboard shows.",
    after_help = "Examples:\n  trendcap bubble --input weekly.json\n  \
                  trendcap donut --input share.json --plain\n  trendcap config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Caption a cumulative-vs-weekly-increase bubble chart")]
    Bubble(ChartArgs),
    #[command(about = "Caption a weekly share donut chart against the previous week")]
    Donut(ChartArgs),
    #[command(about = "Caption a category overlay of relative index lines")]
    Overlay(ChartArgs),
    #[command(about = "Caption per-category small multiples over the rolling window")]
    Multiples(ChartArgs),
    #[command(about = "Caption an A/B comparison of two dates")]
    Compare(ChartArgs),
    #[command(about = "Caption an input whose `chart` field names its kind")]
    Render(ChartArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config {
        #[arg(long, help = "Explicit config file path")]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct ChartArgs {
    #[arg(long, help = "Chart input JSON file")]
    input: PathBuf,
    #[arg(long, help = "Explicit config file path")]
    config: Option<PathBuf>,
    #[arg(long, help = "Print caption lines instead of the JSON payload")]
    plain: bool,
    #[arg(long, help = "Override engine.window")]
    window: Option<usize>,
    #[arg(long, help = "Override engine.max_lines")]
    max_lines: Option<usize>,
    #[arg(long, help = "Override engine.period_label")]
    period_label: Option<String>,
    #[arg(long, help = "Override logging.level (trace, debug, info, warn, error)")]
    log_level: Option<String>,
}

impl ChartArgs {
    fn into_request(self) -> CaptionRequest {
        CaptionRequest {
            input: self.input,
            config_path: self.config,
            plain: self.plain,
            overrides: ConfigOverrides {
                window: self.window,
                max_lines: self.max_lines,
                period_label: self.period_label,
                log_level: self.log_level,
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config { config } => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(config) }
        }
        Command::Bubble(args) => caption(Some(ChartKind::Bubble), args),
        Command::Donut(args) => caption(Some(ChartKind::Donut), args),
        Command::Overlay(args) => caption(Some(ChartKind::Overlay), args),
        Command::Multiples(args) => caption(Some(ChartKind::Multiples), args),
        Command::Compare(args) => caption(Some(ChartKind::Compare), args),
        Command::Render(args) => caption(None, args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn caption(kind: Option<ChartKind>, args: ChartArgs) -> commands::CommandResult {
    let request = args.into_request();
    let config = commands::caption::load_config(&request);
    // A broken config is reported by the command itself.
    if let Ok(config) = &config {
        init_logging(config);
    }
    commands::caption::run_with_config(kind, &request, config)
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

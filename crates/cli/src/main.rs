use std::process::ExitCode;

fn main() -> ExitCode {
    trendcap_cli::run()
}

use std::process::ExitCode;

use clap::Parser;
use log::error;

mod cli;
mod constants;
mod domain;
mod logging;
mod notebook;
mod storage;

use cli::{Cli, run_cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| logging::default_log_level().to_string());
    let _logger = match logging::init_logging(&level, &storage::get_state_dir()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    };

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("event=command_failed status=error error={}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

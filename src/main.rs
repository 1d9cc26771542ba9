//! Main application entry point for lightrules.
//!
//! Parses arguments and dispatches to the scheduler or a one-shot command.
//! Any error that reaches this point is fatal: it is logged with its full
//! context chain and the process exits with status 1.

use anyhow::Result;
use lightrules::args::{self, CliAction, ParsedArgs};
use lightrules::commands::{schedule, simulate};
use lightrules::constants::EXIT_FAILURE;
use lightrules::{Lightrules, log_end, log_error_exit, log_indented};

fn main() {
    if let Err(e) = run() {
        log_error_exit!("{}", e);
        for cause in e.chain().skip(1) {
            log_indented!("caused by: {}", cause);
        }
        log_end!();
        std::process::exit(EXIT_FAILURE);
    }
}

fn run() -> Result<()> {
    let parsed = ParsedArgs::from_env();

    match parsed.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp | CliAction::ShowHelpDueToError => {
            args::display_help();
            Ok(())
        }
        CliAction::Run {
            debug_enabled,
            config_path,
        } => Lightrules::new(debug_enabled)
            .with_config_path(config_path)
            .run(),
        CliAction::Schedule {
            debug_enabled,
            config_path,
        } => schedule::handle_schedule_command(debug_enabled, config_path.as_deref()),
        CliAction::Simulate {
            debug_enabled,
            config_path,
            start_time,
            end_time,
        } => simulate::handle_simulate_command(
            &start_time,
            &end_time,
            debug_enabled,
            config_path.as_deref(),
        ),
    }
}

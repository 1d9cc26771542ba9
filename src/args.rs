//! Command-line argument parsing and processing.
//!
//! Flags may appear before or after the subcommand. Anything unrecognized
//! (an unknown flag, a missing value, a stray positional) falls back to
//! printing help.

use std::path::PathBuf;

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the scheduler against the Hue bridge
    Run {
        debug_enabled: bool,
        config_path: Option<PathBuf>,
    },
    /// Print the next computed action queue and exit
    Schedule {
        debug_enabled: bool,
        config_path: Option<PathBuf>,
    },
    /// Fast-forward the execution loop between two local datetimes
    Simulate {
        debug_enabled: bool,
        config_path: Option<PathBuf>,
        start_time: String,
        end_time: String,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments, including the program name in first position.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;
        let mut config_path: Option<PathBuf> = None;
        let mut positionals: Vec<String> = Vec::new();

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut iter = args_vec.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-d" | "--debug" => debug_enabled = true,
                "-h" | "--help" => display_help = true,
                "-V" | "-v" | "--version" => display_version = true,
                "-c" | "--config" => match iter.next() {
                    Some(path) if !path.starts_with('-') => config_path = Some(PathBuf::from(path)),
                    _ => unknown_arg_found = true,
                },
                other if other.starts_with('-') => unknown_arg_found = true,
                _ => positionals.push(arg),
            }
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if display_help {
            CliAction::ShowHelp
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else {
            match positionals.as_slice() {
                [] => CliAction::Run {
                    debug_enabled,
                    config_path,
                },
                [command] if command == "schedule" => CliAction::Schedule {
                    debug_enabled,
                    config_path,
                },
                [command, start, end] if command == "simulate" => CliAction::Simulate {
                    debug_enabled,
                    config_path,
                    start_time: start.clone(),
                    end_time: end.clone(),
                },
                _ => CliAction::ShowHelpDueToError,
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("lightrules [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <file>    Use a custom configuration file");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("(none)                 Run the scheduler against the Hue bridge");
    log_indented!("schedule               Print the next action for every rule and exit");
    log_indented!("simulate <start> <end> Replay the schedule with simulated time");
    log_indented!("                       Times are \"YYYY-MM-DD HH:MM:SS\" in the configured timezone");
    log_end!();
}

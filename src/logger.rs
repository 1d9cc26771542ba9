//! Structured logging with visual formatting.
//!
//! Every message goes through the `log_*!` macros defined here. They share a
//! box-drawing layout so a long-running daemon log reads as a sequence of
//! blocks: one per scheduling cycle, one per fired action.
//!
//! When a clock is installed with [`Log::set_clock`], each line is prefixed
//! with the current instant in the configured location timezone. Under the
//! `simulate` command that clock is simulated, so the prefix shows the
//! simulated time the engine believes it is.

use chrono_tz::Tz;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::time_source::TimeSource;

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

// Clock and timezone used for line prefixes, installed once at startup
static LOG_CLOCK: OnceLock<(Arc<dyn TimeSource>, Tz)> = OnceLock::new();

/// Main logging interface providing structured output formatting.
///
/// ## Logging Conventions
///
/// - **`log_block_start!`**: starts a new conceptual block (a scheduling cycle,
///   a fired action, loaded configuration). Prints an empty `┃` then `┣ message`.
/// - **`log_decorated!`**: a line that belongs to the current block (`┣ message`).
/// - **`log_indented!`**: nested detail under the previous line (`┃   message`).
/// - **`log_pipe!`**: a single empty `┃` for spacing before a level-tagged message.
/// - **`log_version!`** / **`log_end!`**: the startup header and final marker.
/// - **`log_info!`, `log_warning!`, `log_error!`, `log_debug!`, `log_critical!`**:
///   level-tagged lines (`[INFO]`, `[WARNING]`, ...). `log_error_exit!` closes the
///   log with `┗` and is reserved for fatal errors.
pub struct Log;

impl Log {
    /// Enable or disable logging.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Install the clock used for timestamp prefixes.
    ///
    /// Only the first call has an effect.
    pub fn set_clock(source: Arc<dyn TimeSource>, timezone: Tz) {
        let _ = LOG_CLOCK.set((source, timezone));
    }

    /// Timestamp prefix for the current line, or an empty string without a clock.
    pub fn get_timestamp_prefix() -> String {
        match LOG_CLOCK.get() {
            Some((source, tz)) => {
                let now = source.now().with_timezone(tz);
                format!("[{}] ", now.format("%Y-%m-%d %H:%M:%S"))
            }
            None => String::new(),
        }
    }
}

/// Line layouts produced by the logging macros.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Layout {
    Decorated,
    Indented,
    BlockStart,
    Level { tag: &'static str, color: u8 },
    ErrorExit,
}

/// Render one log line (or two, for block starts) with the given prefix.
pub fn render(layout: Layout, prefix: &str, message: &str) -> String {
    match layout {
        Layout::Decorated => format!("{prefix}┣ {message}\n"),
        Layout::Indented => format!("{prefix}┃   {message}\n"),
        Layout::BlockStart => format!("{prefix}┃\n{prefix}┣ {message}\n"),
        Layout::Level { tag, color } => {
            format!("{prefix}┣[\x1b[{color}m{tag}\x1b[0m] {message}\n")
        }
        Layout::ErrorExit => format!("{prefix}┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] {message}\n"),
    }
}

// Public function that routes output (needed by macros)
pub fn write_output(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

// # Logging Macros

/// Format and emit a message with the given [`Layout`].
#[doc(hidden)]
#[macro_export]
macro_rules! __log_emit {
    // Format string literal (with or without args)
    ($layout:expr, $fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&$crate::logger::render($layout, &prefix, &message));
        }
    }};
    // Non-literal expression - convert to string
    ($layout:expr, $expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!("{}", $expr);
            $crate::logger::write_output(&$crate::logger::render($layout, &prefix, &message));
        }
    }};
}

/// Log a decorated message, typically as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => { $crate::__log_emit!($crate::logger::Layout::Decorated, $($arg)+) };
}

/// Log an indented message for sub-items or details within a block.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => { $crate::__log_emit!($crate::logger::Layout::Indented, $($arg)+) };
}

/// Log a block start message, initiating a new conceptual block of information.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => { $crate::__log_emit!($crate::logger::Layout::BlockStart, $($arg)+) };
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            $crate::logger::write_output(&format!("{prefix}┃\n"));
        }
    }};
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let version = env!("CARGO_PKG_VERSION");
            $crate::logger::write_output(&format!("{prefix}┏ lightrules v{version} ━━╸\n"));
        }
    }};
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            $crate::logger::write_output(&format!("{prefix}╹\n"));
        }
    }};
}

/// Log a warning message with yellow-colored tag.
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => {
        $crate::__log_emit!($crate::logger::Layout::Level { tag: "WARNING", color: 33 }, $($arg)+)
    };
}

/// Log an error message with red-colored tag.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => {
        $crate::__log_emit!($crate::logger::Layout::Level { tag: "ERROR", color: 31 }, $($arg)+)
    };
}

/// Log a fatal error and close the log visually.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => { $crate::__log_emit!($crate::logger::Layout::ErrorExit, $($arg)+) };
}

/// Log an informational message with green-colored tag.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => {
        $crate::__log_emit!($crate::logger::Layout::Level { tag: "INFO", color: 32 }, $($arg)+)
    };
}

/// Log a debug/operational message with green-colored tag.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => {
        $crate::__log_emit!($crate::logger::Layout::Level { tag: "DEBUG", color: 32 }, $($arg)+)
    };
}

/// Log a critical message with red-colored tag.
#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => {
        $crate::__log_emit!($crate::logger::Layout::Level { tag: "CRITICAL", color: 31 }, $($arg)+)
    };
}

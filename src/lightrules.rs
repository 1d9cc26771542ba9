//! Application coordinator for the long-running scheduler.
//!
//! Loads configuration, connects to the Hue bridge, and hands both to the
//! execution loop. Uses a builder so the entry point can choose the
//! configuration file:
//!
//! - Normal startup: `Lightrules::new(debug_enabled).run()`
//! - Explicit config: `Lightrules::new(debug_enabled).with_config_path(path).run()`

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    bridge::hue::HueBridge,
    config::{self, validate_for_run},
    core::{Core, CoreParams, Scheduler},
    logger::Log,
    time_source::{RealTimeSource, TimeSource},
};

/// Builder for configuring and running lightrules.
///
/// # Examples
///
/// ```no_run
/// use lightrules::Lightrules;
///
/// # fn main() -> anyhow::Result<()> {
/// Lightrules::new(false).run()?;
/// # Ok(())
/// # }
/// ```
pub struct Lightrules {
    debug_enabled: bool,
    config_path: Option<PathBuf>,
}

impl Lightrules {
    /// Create a new runner with defaults matching normal run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            config_path: None,
        }
    }

    /// Use a specific configuration file instead of the XDG default.
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Run until a fatal error.
    ///
    /// The real clock never ends, so this only returns with an error.
    pub fn run(self) -> Result<()> {
        log_version!();
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Debug mode enabled, showing bridge traffic and computed queues");
        }

        let config = config::load(self.config_path.as_deref())?;
        let location = config.location()?;
        let rules = config.rules()?;
        let bridge_config = validate_for_run(&config)?;

        let time_source: Arc<dyn TimeSource> = Arc::new(RealTimeSource);
        Log::set_clock(Arc::clone(&time_source), location.timezone);

        config.log_config();

        let bridge = HueBridge::connect(bridge_config, self.debug_enabled).with_context(|| {
            format!("Failed to connect to Hue bridge at {}", bridge_config.ip_address)
        })?;

        let mut core = Core::new(CoreParams {
            bridge,
            scheduler: Scheduler::new(location, rules),
            time_source,
            debug_enabled: self.debug_enabled,
        });

        core.execute()
    }
}

//! Command-line command handlers for lightrules.
//!
//! One-shot commands that load the configuration but never touch real lights.
//! Each command lives in its own submodule.

pub mod schedule;
pub mod simulate;

use anyhow::Result;
use std::path::Path;

use crate::config::{self, Config};
use crate::core::Scheduler;

/// Load configuration and build the scheduler for a one-shot command.
pub(crate) fn load_scheduler(config_path: Option<&Path>) -> Result<(Config, Scheduler)> {
    let config = config::load(config_path)?;
    let scheduler = Scheduler::new(config.location()?, config.rules()?);
    Ok((config, scheduler))
}

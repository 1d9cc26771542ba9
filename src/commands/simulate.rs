//! Implementation of the `simulate` command.
//!
//! Replays the schedule between two local datetimes with a fast-forward clock
//! against an in-memory bridge whose groups all start off. Nothing is sent to
//! real lights. Log lines carry the simulated time.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::bridge::memory::MemoryBridge;
use crate::core::{Core, CoreParams, Scheduler};
use crate::logger::Log;
use crate::rules::{LightState, Rule};
use crate::time_source::{SimulatedTimeSource, TimeSource, parse_datetime_in_tz};

/// Handle `simulate <start> <end>`.
pub fn handle_simulate_command(
    start_time: &str,
    end_time: &str,
    debug_enabled: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let (config, scheduler) = super::load_scheduler(config_path)?;
    let tz = scheduler.location().timezone;
    let (start, end) = parse_window(start_time, end_time, tz)?;

    let time_source: Arc<dyn TimeSource> = Arc::new(SimulatedTimeSource::new(start, end));
    Log::set_clock(Arc::clone(&time_source), tz);

    log_version!();
    log_block_start!("Simulating {} to {} ({})", start_time, end_time, tz);
    if debug_enabled {
        config.log_config();
    }

    let bridge = simulation_bridge(scheduler.rules());
    let core = run_simulation(bridge, scheduler, time_source, debug_enabled)?;

    log_block_start!("Final group states:");
    for (group, state) in core.bridge().groups() {
        log_indented!("{}: {}", group, state);
    }
    log_end!();
    Ok(())
}

/// Parse and order-check the simulation window.
fn parse_window(start_time: &str, end_time: &str, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = parse_datetime_in_tz(start_time, tz).context("Invalid start time")?;
    let end = parse_datetime_in_tz(end_time, tz).context("Invalid end time")?;
    if end <= start {
        bail!("End time must be after start time");
    }
    Ok((start, end))
}

/// In-memory bridge knowing every group the rules mention, all off.
fn simulation_bridge(rules: &[Rule]) -> MemoryBridge {
    let groups: BTreeSet<&str> = rules
        .iter()
        .flat_map(|rule| rule.light_groups.iter().map(String::as_str))
        .collect();
    MemoryBridge::with_groups(groups, LightState::off())
}

fn run_simulation(
    bridge: MemoryBridge,
    scheduler: Scheduler,
    time_source: Arc<dyn TimeSource>,
    debug_enabled: bool,
) -> Result<Core<MemoryBridge>> {
    let mut core = Core::new(CoreParams {
        bridge,
        scheduler,
        time_source,
        debug_enabled,
    });
    core.execute()?;
    Ok(core)
}

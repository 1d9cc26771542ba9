//! Implementation of the `schedule` command.
//!
//! Prints the next firing instant of every rule, in the order the execution
//! loop would process them, then exits.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::logger::Log;
use crate::rules::ScheduledAction;
use crate::time_source::{RealTimeSource, TimeSource};

pub fn handle_schedule_command(debug_enabled: bool, config_path: Option<&Path>) -> Result<()> {
    log_version!();

    let (config, scheduler) = super::load_scheduler(config_path)?;
    let time_source: Arc<dyn TimeSource> = Arc::new(RealTimeSource);
    Log::set_clock(Arc::clone(&time_source), scheduler.location().timezone);

    if debug_enabled {
        config.log_config();
    }

    let queue = scheduler.next_scheduled_actions(time_source.now())?;
    log_schedule(&queue);
    log_end!();
    Ok(())
}

fn log_schedule(queue: &[ScheduledAction]) {
    if queue.is_empty() {
        log_block_start!("No rules configured");
        return;
    }

    log_block_start!("Upcoming actions:");
    for action in queue {
        log_indented!("{}", format_action(action));
        if !action.rule.conditions.is_empty() {
            let conditions: Vec<&str> = action.rule.conditions.iter().map(|c| c.as_str()).collect();
            log_indented!("    only if {}", conditions.join(" and "));
        }
    }
}

fn format_action(action: &ScheduledAction) -> String {
    format!(
        "{}  {}",
        action.scheduled_for.format("%a %Y-%m-%d %H:%M %Z"),
        action.rule
    )
}

//! Core scheduling engine and execution loop.
//!
//! This module drives the daemon:
//!
//! - [`scheduler`]: resolves every rule to its next firing instant and builds
//!   the ordered action queue for one cycle
//! - [`conditions`]: checks a group's live state before a rule fires
//! - [`Core`]: the blocking loop that sleeps until each action and then either
//!   applies it or skips it, group by group
//!
//! Everything runs on one thread. The only suspension points are the sleep
//! before an action and the wait before recomputing a queue with nothing due.
//! Any bridge error ends the loop and is returned to the caller; there is no
//! retry.

pub mod conditions;
pub mod scheduler;

pub use scheduler::Scheduler;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use crate::bridge::LightBridge;
use crate::rules::ScheduledAction;
use crate::time_source::TimeSource;

/// Parameters for creating a Core instance.
pub struct CoreParams<B> {
    pub bridge: B,
    pub scheduler: Scheduler,
    pub time_source: Arc<dyn TimeSource>,
    pub debug_enabled: bool,
}

/// Execution loop state.
pub struct Core<B: LightBridge> {
    bridge: B,
    scheduler: Scheduler,
    time_source: Arc<dyn TimeSource>,
    debug_enabled: bool,
    applied_count: usize,
    skipped_count: usize,
}

impl<B: LightBridge> Core<B> {
    pub fn new(params: CoreParams<B>) -> Self {
        Self {
            bridge: params.bridge,
            scheduler: params.scheduler,
            time_source: params.time_source,
            debug_enabled: params.debug_enabled,
            applied_count: 0,
            skipped_count: 0,
        }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn into_bridge(self) -> B {
        self.bridge
    }

    /// Number of group state changes applied so far.
    pub fn applied_count(&self) -> usize {
        self.applied_count
    }

    /// Number of groups skipped because a condition was not met.
    pub fn skipped_count(&self) -> usize {
        self.skipped_count
    }

    /// Run scheduling cycles until the time source ends or an error occurs.
    ///
    /// With the real clock this only returns on error.
    pub fn execute(&mut self) -> Result<()> {
        if self.scheduler.rules().is_empty() {
            bail!("No rules configured, nothing to schedule");
        }

        log_block_start!(
            "Scheduling {} rule(s) against the {} bridge",
            self.scheduler.rules().len(),
            self.bridge.bridge_name()
        );

        while !self.time_source.is_ended() {
            self.run_cycle()?;
        }

        if self.time_source.is_simulated() {
            log_block_start!(
                "Reached end of simulated time: {} applied, {} skipped",
                self.applied_count,
                self.skipped_count
            );
        }
        Ok(())
    }

    /// Compute a fresh queue and work through it.
    ///
    /// The earliest action is always processed. Later actions are processed only
    /// while they fall within a day of the cycle start; anything further out is
    /// recomputed next cycle so a sparse weekly rule cannot hold back daily ones.
    ///
    /// Rules left out of the queue (no solar event nearby) get another chance a
    /// day later, so the loop never sleeps past that while any are waiting.
    fn run_cycle(&mut self) -> Result<()> {
        let cycle_start = self.time_source.now();
        let queue = self
            .scheduler
            .next_scheduled_actions(cycle_start)
            .context("Failed to compute the action queue")?;

        if self.debug_enabled {
            self.log_queue(&queue);
        }

        let horizon = cycle_start + Duration::days(1);
        let deferred = self.scheduler.rules().len() - queue.len();
        let first_due = queue
            .first()
            .map(|action| action.scheduled_for.with_timezone(&Utc));
        if first_due.is_none_or(|due| deferred > 0 && due > horizon) {
            self.wait_to_reschedule(horizon, deferred);
            return Ok(());
        }

        for (index, action) in queue.iter().enumerate() {
            if index > 0 && action.scheduled_for.with_timezone(&Utc) > horizon {
                break;
            }

            self.wait_for(action);
            if self.time_source.is_ended() {
                return Ok(());
            }

            self.fire(action)?;
        }
        Ok(())
    }

    /// Sleep until the action is due. Past-due actions proceed immediately.
    fn wait_for(&self, action: &ScheduledAction) {
        let now = self.time_source.now();
        let wait = time_until(now, action.scheduled_for.with_timezone(&Utc));

        log_block_start!(
            "Next: {} at {}",
            action.rule,
            action.scheduled_for.format("%Y-%m-%d %H:%M:%S %Z")
        );
        if !wait.is_zero() {
            log_indented!("Sleeping for {}", format_wait(wait));
        }

        self.time_source.sleep(wait);
    }

    /// Sleep until `until`, then let the next cycle recompute the queue.
    fn wait_to_reschedule(&self, until: DateTime<Utc>, deferred: usize) {
        let wait = time_until(self.time_source.now(), until);
        log_block_start!(
            "{} rule(s) deferred, nothing due before {}",
            deferred,
            until
                .with_timezone(&self.scheduler.location().timezone)
                .format("%Y-%m-%d %H:%M:%S %Z")
        );
        log_indented!("Rescheduling in {}", format_wait(wait));
        self.time_source.sleep(wait);
    }

    /// Evaluate and apply an action for each of its groups in order.
    fn fire(&mut self, action: &ScheduledAction) -> Result<()> {
        let rule = &action.rule;

        for group in &rule.light_groups {
            let holds =
                conditions::satisfied(&self.bridge, group, &rule.conditions, self.debug_enabled)
                    .with_context(|| format!("Failed to evaluate conditions for group '{group}'"))?;

            if !holds {
                log_decorated!("Skipping {}: conditions not met", group);
                self.skipped_count += 1;
                continue;
            }

            self.bridge
                .set_group_light_state(group, rule.target_state)
                .with_context(|| {
                    format!("Failed to set group '{group}' to {}", rule.target_state)
                })?;

            log_decorated!("Applied {} to {}", rule.target_state, group);
            self.applied_count += 1;
        }

        Ok(())
    }

    fn log_queue(&self, queue: &[ScheduledAction]) {
        log_debug!("Computed queue of {} action(s):", queue.len());
        for action in queue {
            log_indented!(
                "{} {}",
                action.scheduled_for.format("%Y-%m-%d %H:%M:%S %Z"),
                action.rule
            );
        }
    }
}

/// Non-negative wait from `now` until `target`.
fn time_until(now: DateTime<Utc>, target: DateTime<Utc>) -> StdDuration {
    (target - now).to_std().unwrap_or(StdDuration::ZERO)
}

fn format_wait(wait: StdDuration) -> String {
    let total = wait.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m {seconds}s"),
        _ => format!("{hours}h {minutes}m"),
    }
}

#[cfg(test)]
mod tests;

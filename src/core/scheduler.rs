//! Trigger resolution and action queue construction.
//!
//! Each scheduling cycle turns the rule set into an ordered queue of
//! [`ScheduledAction`]s: every rule is resolved to the next instant strictly
//! after "now", then the queue is stably sorted so rules resolving to the same
//! instant keep their configured order.
//!
//! A solar rule whose event does not occur in the next few days (polar day or
//! night) is left out of the queue for that cycle.
//!
//! All wall-clock arithmetic happens in the location's timezone. "Tomorrow"
//! means the next calendar date at the same local time of day, which is 23 or
//! 25 hours away across a DST change.

use anyhow::{Result, bail};
use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::constants::MAX_LOOKAHEAD_DAYS;
use crate::geo::{SolarTimes, next_event_from, next_sunrise_sunset};
use crate::rules::{
    DaySet, LocationConfig, Rule, ScheduledAction, SolarEventKind, TimeOfDay, TimeTrigger,
};

/// Owns the immutable rule set and location for the process lifetime.
#[derive(Debug, Clone)]
pub struct Scheduler {
    location: LocationConfig,
    rules: Vec<Rule>,
}

impl Scheduler {
    pub fn new(location: LocationConfig, rules: Vec<Rule>) -> Self {
        Self { location, rules }
    }

    pub fn location(&self) -> &LocationConfig {
        &self.location
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// One action per schedulable rule, ascending by firing instant, ties in rule order.
    pub fn next_scheduled_actions(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledAction>> {
        let tz = self.location.timezone;
        let local_now = now.with_timezone(&tz);

        // Shared by every solar rule in this cycle
        let solar = next_sunrise_sunset(&self.location, now)?;

        let mut actions = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            match self.resolve(rule, local_now, &solar)? {
                Some(scheduled_for) => actions.push(ScheduledAction {
                    rule: rule.clone(),
                    scheduled_for,
                }),
                None => log_warning!(
                    "Sun does not cross the horizon near {} at latitude {:.2}, deferring: {}",
                    local_now.date_naive(),
                    self.location.latitude,
                    rule
                ),
            }
        }

        // sort_by_key is stable
        actions.sort_by_key(|action| action.scheduled_for);
        Ok(actions)
    }

    /// Next firing instant of a single rule, localized to the configured timezone.
    ///
    /// `None` when the rule's solar event does not occur in the search window.
    pub fn resolve(
        &self,
        rule: &Rule,
        now: DateTime<Tz>,
        solar: &SolarTimes,
    ) -> Result<Option<DateTime<Tz>>> {
        match rule.trigger {
            TimeTrigger::FixedLocalTime(time) => resolve_fixed_time(time, rule.days, now).map(Some),
            TimeTrigger::SolarEvent(kind) => {
                let event = self.resolve_solar(kind, rule.days, solar.get(kind))?;
                Ok(event.map(|event| event.with_timezone(&self.location.timezone)))
            }
        }
    }

    /// Advance a shared solar event until it lands on a permitted weekday.
    fn resolve_solar(
        &self,
        kind: SolarEventKind,
        days: DaySet,
        shared: Option<DateTime<Utc>>,
    ) -> Result<Option<DateTime<Utc>>> {
        let tz = self.location.timezone;
        let Some(mut event) = shared else {
            return Ok(None);
        };
        for _ in 0..=MAX_LOOKAHEAD_DAYS {
            let local = event.with_timezone(&tz);
            if days.allows(local.weekday()) {
                return Ok(Some(event));
            }
            let next_date = local.date_naive().succ_opt().unwrap_or(NaiveDate::MAX);
            match next_event_from(&self.location, next_date, event, kind)? {
                Some(next) => event = next,
                None => return Ok(None),
            }
        }
        bail!("No {kind} on a permitted weekday ({days}) within {MAX_LOOKAHEAD_DAYS} days")
    }
}

/// Next occurrence of `time` strictly after `now` on a permitted weekday.
///
/// Today is tried first, then each following calendar date.
pub fn resolve_fixed_time(time: TimeOfDay, days: DaySet, now: DateTime<Tz>) -> Result<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();

    for date in today.iter_days().take(MAX_LOOKAHEAD_DAYS as usize + 1) {
        if !days.allows(date.weekday()) {
            continue;
        }
        let candidate = localize(tz, date, time.as_naive_time());
        if candidate > now {
            return Ok(candidate);
        }
    }
    bail!("No {time} on a permitted weekday ({days}) within {MAX_LOOKAHEAD_DAYS} days")
}

/// Wall-clock date and time in `tz`.
///
/// An ambiguous time (clocks going back) resolves to the earlier instant. A
/// time skipped by clocks going forward resolves to the same wall time one
/// hour later, just past the jump.
pub(crate) fn localize(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(instant) => instant,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}

//! Time source abstraction for supporting both real-time and simulated time.
//!
//! The execution loop never reads the system clock or sleeps directly; it goes
//! through a [`TimeSource`]. Production uses [`RealTimeSource`]. The `simulate`
//! command and the tests use [`SimulatedTimeSource`], which jumps through every
//! sleep instantly so days of schedule can be replayed in milliseconds.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration as StdDuration;

use crate::constants::SIMULATION_DATETIME_FORMAT;

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current instant
    fn now(&self) -> DateTime<Utc>;

    /// Sleep for the specified duration (or simulate it)
    fn sleep(&self, duration: StdDuration);

    /// Check if this is a simulated time source
    fn is_simulated(&self) -> bool;

    /// Check if simulation has ended (always false for real time)
    fn is_ended(&self) -> bool {
        false
    }
}

/// Real-time implementation that uses actual system time
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Fast-forward simulated clock.
///
/// `sleep` advances the clock by exactly the requested duration, capped at
/// the end time. Once the end is reached, [`TimeSource::is_ended`] reports true
/// and the execution loop stops.
pub struct SimulatedTimeSource {
    end_time: DateTime<Utc>,
    /// Current simulated instant as milliseconds since the Unix epoch
    current_millis: AtomicI64,
}

impl SimulatedTimeSource {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            end_time,
            current_millis: AtomicI64::new(start_time.timestamp_millis()),
        }
    }

    fn current_time(&self) -> DateTime<Utc> {
        let millis = self.current_millis.load(Ordering::SeqCst);
        DateTime::from_timestamp_millis(millis).unwrap_or(self.end_time)
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        self.current_time()
    }

    fn sleep(&self, duration: StdDuration) {
        let step = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        let end = self.end_time.timestamp_millis();
        let _ = self
            .current_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(step).min(end))
            });
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn is_ended(&self) -> bool {
        self.current_time() >= self.end_time
    }
}

/// Parse a `YYYY-MM-DD HH:MM:SS` wall-clock time in a specific timezone.
///
/// Ambiguous times (the repeated hour when clocks fall back) resolve to the
/// earlier instant; times inside a spring-forward gap are rejected.
pub fn parse_datetime_in_tz(s: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, SIMULATION_DATETIME_FORMAT)
        .with_context(|| format!("Invalid datetime '{s}'. Use YYYY-MM-DD HH:MM:SS"))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("'{s}' does not exist in timezone {tz}"))
}

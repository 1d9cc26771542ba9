//! Rule data model.
//!
//! These are the validated, immutable types the scheduler and execution loop
//! work with. The raw TOML shapes live in [`crate::config`] and are converted
//! into these types during loading, so every value here is already known to
//! be in range.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveTime, Weekday};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

use crate::constants::*;

/// Geographic location and timezone used for every wall-clock computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationConfig {
    pub timezone: Tz,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationConfig {
    /// Build a location, checking coordinate ranges.
    pub fn new(timezone: Tz, latitude: f64, longitude: f64) -> Result<Self> {
        if !(MINIMUM_LATITUDE..=MAXIMUM_LATITUDE).contains(&latitude) {
            bail!("latitude must be between -90 and 90 degrees (got {latitude})");
        }
        if !(MINIMUM_LONGITUDE..=MAXIMUM_LONGITUDE).contains(&longitude) {
            bail!("longitude must be between -180 and 180 degrees (got {longitude})");
        }
        Ok(Self {
            timezone,
            latitude,
            longitude,
        })
    }
}

/// A wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        if hour > 23 {
            bail!("hour must be between 0 and 23 (got {hour})");
        }
        if minute > 59 {
            bail!("minute must be between 0 and 59 (got {minute})");
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        // Both components are range-checked in `new`
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for TimeOfDay {
    type Err = anyhow::Error;

    /// Parse `HH:MM`.
    fn from_str(s: &str) -> Result<Self> {
        let (hour, minute) = s
            .split_once(':')
            .filter(|(_, rest)| !rest.contains(':'))
            .with_context(|| format!("Time of day must contain exactly one ':' (got \"{s}\")"))?;
        let hour = hour
            .trim()
            .parse()
            .with_context(|| format!("Invalid hour in \"{s}\""))?;
        let minute = minute
            .trim()
            .parse()
            .with_context(|| format!("Invalid minute in \"{s}\""))?;
        Self::new(hour, minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Solar events a rule can be triggered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolarEventKind {
    Sunrise,
    Sunset,
}

impl SolarEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolarEventKind::Sunrise => "sunrise",
            SolarEventKind::Sunset => "sunset",
        }
    }
}

impl FromStr for SolarEventKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sunrise" => Ok(SolarEventKind::Sunrise),
            "sunset" => Ok(SolarEventKind::Sunset),
            other => bail!("Unrecognized solar event: {other}"),
        }
    }
}

impl fmt::Display for SolarEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a rule fires: a fixed local time of day or a solar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeTrigger {
    FixedLocalTime(TimeOfDay),
    SolarEvent(SolarEventKind),
}

impl fmt::Display for TimeTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeTrigger::FixedLocalTime(time) => write!(f, "at {time}"),
            TimeTrigger::SolarEvent(kind) => write!(f, "at {kind}"),
        }
    }
}

/// Set of weekdays a rule is allowed to fire on.
///
/// An empty set means "every day".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DaySet(u8);

impl DaySet {
    pub fn every_day() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn is_every_day(&self) -> bool {
        self.0 == 0
    }

    pub fn allows(&self, day: Weekday) -> bool {
        self.is_every_day() || self.0 & (1 << day.num_days_from_monday()) != 0
    }

    /// Parse the two-letter tokens used in the config file (`MO`..`SU`).
    pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let mut days = Self::every_day();
        for token in tokens {
            days.insert(parse_weekday_token(token.as_ref())?);
        }
        Ok(days)
    }
}

impl FromIterator<Weekday> for DaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut days = Self::every_day();
        for day in iter {
            days.insert(day);
        }
        days
    }
}

impl fmt::Display for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_every_day() {
            return f.write_str("every day");
        }
        let mut day = Weekday::Mon;
        let mut names = Vec::new();
        for _ in 0..7 {
            if self.allows(day) {
                names.push(weekday_token(day));
            }
            day = day.succ();
        }
        f.write_str(&names.join(","))
    }
}

fn parse_weekday_token(token: &str) -> Result<Weekday> {
    Ok(match token {
        "MO" => Weekday::Mon,
        "TU" => Weekday::Tue,
        "WE" => Weekday::Wed,
        "TH" => Weekday::Thu,
        "FR" => Weekday::Fri,
        "SA" => Weekday::Sat,
        "SU" => Weekday::Sun,
        other => bail!("Unrecognized weekday: {other}"),
    })
}

fn weekday_token(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Desired or observed state of a light group.
///
/// A brightness of 0 means off; anything above 0 means on at that brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightState {
    brightness_percent: u8,
}

impl LightState {
    pub fn new(brightness_percent: u8) -> Result<Self> {
        if brightness_percent > MAXIMUM_BRIGHTNESS_PERCENT {
            bail!(
                "brightness ({brightness_percent}%) must be between {MINIMUM_BRIGHTNESS_PERCENT}% and {MAXIMUM_BRIGHTNESS_PERCENT}%"
            );
        }
        Ok(Self { brightness_percent })
    }

    pub fn off() -> Self {
        Self {
            brightness_percent: 0,
        }
    }

    /// Build a state from a reading that cannot fail, clamping anything above 100%.
    pub fn saturating(brightness_percent: u8) -> Self {
        Self {
            brightness_percent: brightness_percent.min(MAXIMUM_BRIGHTNESS_PERCENT),
        }
    }

    pub fn brightness_percent(&self) -> u8 {
        self.brightness_percent
    }

    pub fn is_on(&self) -> bool {
        self.brightness_percent > 0
    }
}

impl FromStr for LightState {
    type Err = anyhow::Error;

    /// Parse a brightness such as `"40%"`.
    fn from_str(s: &str) -> Result<Self> {
        let number = s
            .trim()
            .strip_suffix('%')
            .with_context(|| format!("Brightness must end in a percentage sign (got \"{s}\")"))?;
        let percent: u8 = number
            .trim()
            .parse()
            .with_context(|| format!("Invalid brightness percentage \"{s}\""))?;
        Self::new(percent)
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_on() {
            write!(f, "on @ {}%", self.brightness_percent)
        } else {
            f.write_str("off")
        }
    }
}

/// Precondition checked against a group's live state right before a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    LightsAreOn,
    LightsAreOff,
}

impl Condition {
    pub fn is_satisfied_by(&self, state: &LightState) -> bool {
        match self {
            Condition::LightsAreOn => state.is_on(),
            Condition::LightsAreOff => !state.is_on(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::LightsAreOn => "lights_are_on",
            Condition::LightsAreOff => "lights_are_off",
        }
    }
}

impl FromStr for Condition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lights_are_on" => Ok(Condition::LightsAreOn),
            "lights_are_off" => Ok(Condition::LightsAreOff),
            other => bail!("Unrecognized condition type: {other}"),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binding of a trigger, target groups, a desired state and preconditions.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub days: DaySet,
    pub light_groups: Vec<String>,
    pub trigger: TimeTrigger,
    pub target_state: LightState,
    pub conditions: Vec<Condition>,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} {}",
            self.light_groups.join(", "),
            self.target_state,
            self.trigger
        )?;
        if !self.days.is_every_day() {
            write!(f, " ({})", self.days)?;
        }
        Ok(())
    }
}

/// One rule paired with its next firing instant, valid for one scheduling cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledAction {
    pub rule: Rule,
    pub scheduled_for: DateTime<Tz>,
}

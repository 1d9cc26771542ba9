//! Configuration system for lightrules.
//!
//! Reads a TOML file into the raw [`Config`] structure, validates it, and
//! converts it into the domain types the scheduler works with
//! ([`LocationConfig`] and [`Rule`]).
//!
//! ## Configuration Sources
//!
//! 1. The path given with `--config <file>`
//! 2. **XDG_CONFIG_HOME**/lightrules/lightrules.toml
//!
//! A missing file is an error; no default file is generated.
//!
//! ## Configuration Structure
//!
//! ```toml
//! [location]
//! timezone = "America/Los_Angeles"   # IANA zone
//! latitude = 37.77                   # -90 to 90
//! longitude = -122.42                # -180 to 180
//!
//! [hue_bridge]
//! ip_address = "192.168.1.10"
//! username = "bridge-api-username"
//! timeout_secs = 10                  # optional, no timeout when absent
//!
//! [[rules]]
//! days = ["MO", "TU", "WE", "TH", "FR"]       # optional, every day when absent
//! light_groups = ["Living Room"]
//! time_trigger = { local_time = "22:00" }     # or { solar_event = "sunset" }
//! light_state = { brightness = "0%" }
//! conditions = [{ type = "lights_are_on" }]   # optional
//! ```

pub mod loading;
pub mod validation;

use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::rules::{
    Condition, DaySet, LightState, LocationConfig, Rule, SolarEventKind, TimeOfDay, TimeTrigger,
};

pub use loading::{get_config_path, load, load_from_path};
pub use validation::{validate_config, validate_for_run};

/// Raw configuration as read from `lightrules.toml`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub location: LocationSection,

    /// Required to run against real lights; `schedule` and `simulate` work without it.
    pub hue_bridge: Option<HueBridgeConfig>,

    /// Rules in configured order. Order breaks ties between rules firing at the same instant.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LocationSection {
    pub timezone: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Connection settings for the Philips Hue bridge.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HueBridgeConfig {
    pub ip_address: String,
    pub username: String,
    /// Global per-request timeout. Requests block until answered when absent.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RuleConfig {
    #[serde(default)]
    pub days: Vec<String>,
    pub light_groups: Vec<String>,
    pub time_trigger: TimeTriggerConfig,
    pub light_state: LightStateConfig,
    #[serde(default)]
    pub conditions: Vec<ConditionConfig>,
}

/// Exactly one of the two fields must be set.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct TimeTriggerConfig {
    pub local_time: Option<String>,
    pub solar_event: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LightStateConfig {
    /// Percentage string such as `"40%"`.
    pub brightness: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ConditionConfig {
    #[serde(rename = "type")]
    pub kind: String,
}

impl TimeTriggerConfig {
    pub fn to_trigger(&self) -> Result<TimeTrigger> {
        match (&self.local_time, &self.solar_event) {
            (Some(time), None) => Ok(TimeTrigger::FixedLocalTime(time.parse::<TimeOfDay>()?)),
            (None, Some(event)) => Ok(TimeTrigger::SolarEvent(event.parse::<SolarEventKind>()?)),
            (Some(_), Some(_)) => {
                bail!("time_trigger must set only one of local_time or solar_event, not both")
            }
            (None, None) => bail!("time_trigger must set one of local_time or solar_event"),
        }
    }
}

impl RuleConfig {
    pub fn to_rule(&self) -> Result<Rule> {
        if self.light_groups.is_empty() {
            bail!("light_groups must name at least one group");
        }
        if let Some(blank) = self.light_groups.iter().find(|g| g.trim().is_empty()) {
            bail!("light group names must not be blank (got \"{blank}\")");
        }

        let conditions = self
            .conditions
            .iter()
            .map(|c| c.kind.parse::<Condition>())
            .collect::<Result<Vec<_>>>()?;

        Ok(Rule {
            days: DaySet::parse_tokens(&self.days)?,
            light_groups: self.light_groups.clone(),
            trigger: self.time_trigger.to_trigger()?,
            target_state: self.light_state.brightness.parse::<LightState>()?,
            conditions,
        })
    }
}

impl Config {
    /// Location converted into its validated form.
    pub fn location(&self) -> Result<LocationConfig> {
        let timezone: Tz = self
            .location
            .timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Unknown timezone \"{}\"", self.location.timezone))?;
        LocationConfig::new(timezone, self.location.latitude, self.location.longitude)
    }

    /// Every rule converted into its validated form, in configured order.
    pub fn rules(&self) -> Result<Vec<Rule>> {
        self.rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                rule.to_rule()
                    .with_context(|| format!("Invalid rule #{}", index + 1))
            })
            .collect()
    }

    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");

        let lat = self.location.latitude;
        let lon = self.location.longitude;
        let lat_dir = if lat >= 0.0 { "N" } else { "S" };
        let lon_dir = if lon >= 0.0 { "E" } else { "W" };
        log_indented!(
            "Location: {:.3}°{}, {:.3}°{} ({})",
            lat.abs(),
            lat_dir,
            lon.abs(),
            lon_dir,
            self.location.timezone
        );

        match &self.hue_bridge {
            Some(bridge) => match bridge.timeout_secs {
                Some(secs) => log_indented!("Hue bridge: {} (timeout {}s)", bridge.ip_address, secs),
                None => log_indented!("Hue bridge: {}", bridge.ip_address),
            },
            None => log_indented!("Hue bridge: not configured"),
        }

        match self.rules() {
            Ok(rules) => {
                log_indented!("Rules: {}", rules.len());
                for rule in &rules {
                    log_indented!("  {}", rule);
                }
            }
            Err(_) => log_indented!("Rules: {} (unvalidated)", self.rules.len()),
        }
    }
}

//! Configuration validation functionality.
//!
//! Load-time checks reject malformed triggers, out-of-range values and unknown
//! tokens before the execution loop ever starts. Checks that only matter for
//! driving real lights live in [`validate_for_run`].

use anyhow::{Result, bail};

use super::{Config, HueBridgeConfig};

/// Validate everything a loaded configuration must satisfy.
pub fn validate_config(config: &Config) -> Result<()> {
    // Conversions are the single source of truth for value ranges and tokens
    config.location()?;
    config.rules()?;

    if let Some(bridge) = &config.hue_bridge {
        validate_hue_bridge(bridge)?;
    }

    Ok(())
}

/// Additional requirements for running the daemon against the Hue bridge.
pub fn validate_for_run(config: &Config) -> Result<&HueBridgeConfig> {
    let Some(bridge) = config.hue_bridge.as_ref() else {
        bail!("A [hue_bridge] section is required to run");
    };
    if config.rules.is_empty() {
        bail!("At least one [[rules]] entry is required to run");
    }
    Ok(bridge)
}

fn validate_hue_bridge(bridge: &HueBridgeConfig) -> Result<()> {
    if bridge.ip_address.trim().is_empty() {
        bail!("hue_bridge.ip_address must not be empty");
    }
    if bridge.username.trim().is_empty() {
        bail!("hue_bridge.username must not be empty");
    }
    if bridge.timeout_secs == Some(0) {
        bail!("hue_bridge.timeout_secs must be at least 1 second (omit it to disable the timeout)");
    }
    Ok(())
}

//! Philips Hue bridge client.
//!
//! - Blocking client using `ureq` (no async), one request at a time.
//! - Talks to the bridge's local v1 REST API (`/api/<username>/groups`).
//! - Group names are resolved to bridge ids once at connect time.
//!
//! Brightness mapping: the bridge uses 0-254. Percentages are rounded up on
//! write and down on read, so 1% is never sent as 0 and a read never reports
//! more than was set. A set-then-get round trip is therefore not guaranteed
//! to return the exact original percentage.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use super::{BridgeError, LightBridge};
use crate::config::HueBridgeConfig;
use crate::constants::{HUE_MAX_BRIGHTNESS, MAXIMUM_BRIGHTNESS_PERCENT};
use crate::rules::LightState;

/// Group as returned by `GET /groups` and `GET /groups/<id>`.
#[derive(Debug, Deserialize)]
struct HueGroup {
    name: String,
    #[serde(default)]
    action: HueGroupAction,
    #[serde(default)]
    state: Option<HueGroupStatus>,
}

/// Last state commanded to the group.
#[derive(Debug, Default, Deserialize)]
struct HueGroupAction {
    #[serde(default)]
    on: bool,
    #[serde(default)]
    bri: Option<u8>,
}

/// Aggregate state of the lights in the group.
#[derive(Debug, Deserialize)]
struct HueGroupStatus {
    any_on: bool,
}

#[derive(Debug, Serialize, PartialEq)]
struct GroupActionRequest {
    on: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    bri: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct HueApiError {
    #[serde(default)]
    address: String,
    #[serde(default)]
    description: String,
}

impl From<ureq::Error> for BridgeError {
    fn from(value: ureq::Error) -> Self {
        match value {
            ureq::Error::StatusCode(status) => BridgeError::Http {
                status,
                message: "request rejected by bridge".to_string(),
            },
            other => BridgeError::Transport(other.to_string()),
        }
    }
}

/// Convert a percentage to the bridge's 0-254 scale, rounding up.
pub fn percent_to_hue(percent: u8) -> u8 {
    let percent = u32::from(percent.min(MAXIMUM_BRIGHTNESS_PERCENT));
    let scaled = (u32::from(HUE_MAX_BRIGHTNESS) * percent).div_ceil(100);
    scaled.min(u32::from(HUE_MAX_BRIGHTNESS)) as u8
}

/// Convert the bridge's 0-254 scale to a percentage, rounding down.
///
/// A reading of 255 also maps to 100.
pub fn hue_to_percent(bri: u8) -> u8 {
    (u32::from(bri) * 100 / u32::from(HUE_MAX_BRIGHTNESS)) as u8
}

/// Body sent to `PUT /groups/<id>/action` for a target state.
fn action_request(state: LightState) -> GroupActionRequest {
    if state.is_on() {
        GroupActionRequest {
            on: true,
            bri: Some(percent_to_hue(state.brightness_percent())),
        }
    } else {
        GroupActionRequest {
            on: false,
            bri: None,
        }
    }
}

/// Observed state of a group, forced to off when no light in it is on.
fn observed_state(group: &HueGroup) -> LightState {
    let on = group
        .state
        .as_ref()
        .map(|status| status.any_on)
        .unwrap_or(group.action.on);
    if !on {
        return LightState::off();
    }
    LightState::saturating(hue_to_percent(group.action.bri.unwrap_or(HUE_MAX_BRIGHTNESS)))
}

/// The bridge reports failures as `[{"error": {...}}]` with a 200 status.
fn first_api_error(value: &Value) -> Option<BridgeError> {
    value.as_array()?.iter().find_map(|item| {
        let error = item.get("error")?;
        let parsed: HueApiError = serde_json::from_value(error.clone()).ok()?;
        Some(BridgeError::Api {
            address: parsed.address,
            description: parsed.description,
        })
    })
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, BridgeError> {
    if let Some(error) = first_api_error(&value) {
        return Err(error);
    }
    Ok(serde_json::from_value(value)?)
}

/// Build the name → id table, keeping the lowest id for duplicate names.
fn index_groups(groups: BTreeMap<String, HueGroup>) -> HashMap<String, String> {
    let mut ids = HashMap::new();
    for (id, group) in groups {
        ids.entry(group.name).or_insert(id);
    }
    ids
}

/// Client for a single Hue bridge.
pub struct HueBridge {
    agent: ureq::Agent,
    base_url: String,
    group_ids: HashMap<String, String>,
    debug_enabled: bool,
}

impl HueBridge {
    /// Connect to the bridge and fetch its group table.
    ///
    /// Without `timeout_secs`, requests block until the bridge answers.
    pub fn connect(config: &HueBridgeConfig, debug_enabled: bool) -> Result<Self, BridgeError> {
        let timeout = config.timeout_secs.map(Duration::from_secs);
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .build();
        let agent = ureq::Agent::new_with_config(agent_config);
        let base_url = format!("http://{}/api/{}", config.ip_address, config.username);

        let mut bridge = Self {
            agent,
            base_url,
            group_ids: HashMap::new(),
            debug_enabled,
        };

        let groups: BTreeMap<String, HueGroup> = bridge.get_json("/groups")?;
        bridge.group_ids = index_groups(groups);

        log_block_start!("Connected to Hue bridge at {}", config.ip_address);
        let mut names: Vec<_> = bridge.group_ids.iter().collect();
        names.sort();
        for (name, id) in names {
            log_indented!("Group {}: {}", id, name);
        }

        Ok(bridge)
    }

    fn group_id(&self, group: &str) -> Result<&str, BridgeError> {
        self.group_ids
            .get(group)
            .map(String::as_str)
            .ok_or_else(|| BridgeError::UnknownGroup(group.to_string()))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BridgeError> {
        let url = format!("{}{}", self.base_url, path);
        let mut response = self
            .agent
            .get(&url)
            .header("Accept", "application/json")
            .call()?;
        let value: Value = response.body_mut().read_json()?;
        decode(value)
    }

    fn put_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, BridgeError> {
        let url = format!("{}{}", self.base_url, path);
        let mut response = self.agent.put(&url).send_json(body)?;
        let value: Value = response.body_mut().read_json()?;
        decode(value)
    }
}

impl LightBridge for HueBridge {
    fn set_group_light_state(
        &mut self,
        group: &str,
        state: LightState,
    ) -> Result<(), BridgeError> {
        let id = self.group_id(group)?.to_string();
        let request = action_request(state);

        if self.debug_enabled {
            log_debug!("PUT group {} ({}) action: {:?}", id, group, request);
        }

        let response = self.put_json(&format!("/groups/{id}/action"), &request)?;

        if self.debug_enabled {
            log_indented!("Response from bridge: {}", response);
        }
        Ok(())
    }

    fn get_group_light_state(&self, group: &str) -> Result<LightState, BridgeError> {
        let id = self.group_id(group)?;
        let details: HueGroup = self.get_json(&format!("/groups/{id}"))?;
        let state = observed_state(&details);

        if self.debug_enabled {
            log_debug!("Group {} ({}) is {}", id, group, state);
        }
        Ok(state)
    }

    fn bridge_name(&self) -> &'static str {
        "Hue"
    }
}

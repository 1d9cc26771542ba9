//! In-process light bridge.
//!
//! Holds group state in a map and records every applied state in order.
//! Used by the `simulate` command so a schedule can be replayed without
//! touching real lights, and by the integration tests.

use std::collections::BTreeMap;

use super::{BridgeError, LightBridge};
use crate::rules::LightState;

/// A state change recorded by [`MemoryBridge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedState {
    pub group: String,
    pub state: LightState,
}

#[derive(Debug, Default)]
pub struct MemoryBridge {
    groups: BTreeMap<String, LightState>,
    applied: Vec<AppliedState>,
}

impl MemoryBridge {
    /// Bridge knowing the given groups, all starting in `initial` state.
    pub fn with_groups<I, S>(groups: I, initial: LightState) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: groups.into_iter().map(|g| (g.into(), initial)).collect(),
            applied: Vec::new(),
        }
    }

    /// Force a group's state without recording it as applied.
    pub fn set_initial_state(&mut self, group: &str, state: LightState) {
        self.groups.insert(group.to_string(), state);
    }

    /// Every state applied so far, oldest first.
    pub fn applied(&self) -> &[AppliedState] {
        &self.applied
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, LightState)> {
        self.groups.iter().map(|(name, state)| (name.as_str(), *state))
    }
}

impl LightBridge for MemoryBridge {
    fn set_group_light_state(
        &mut self,
        group: &str,
        state: LightState,
    ) -> Result<(), BridgeError> {
        let current = self
            .groups
            .get_mut(group)
            .ok_or_else(|| BridgeError::UnknownGroup(group.to_string()))?;
        *current = state;
        self.applied.push(AppliedState {
            group: group.to_string(),
            state,
        });
        Ok(())
    }

    fn get_group_light_state(&self, group: &str) -> Result<LightState, BridgeError> {
        self.groups
            .get(group)
            .copied()
            .ok_or_else(|| BridgeError::UnknownGroup(group.to_string()))
    }

    fn bridge_name(&self) -> &'static str {
        "memory"
    }
}

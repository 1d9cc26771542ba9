//! Pre-fire condition evaluation.

use crate::bridge::{BridgeError, LightBridge};
use crate::rules::Condition;

/// Whether every condition holds for `group` right now.
///
/// Conditions are checked in order with a fresh bridge read for each one, and
/// evaluation stops at the first unsatisfied condition. An empty list is
/// satisfied without touching the bridge. A read failure is returned as is.
pub fn satisfied<B: LightBridge + ?Sized>(
    bridge: &B,
    group: &str,
    conditions: &[Condition],
    debug_enabled: bool,
) -> Result<bool, BridgeError> {
    for condition in conditions {
        let state = bridge.get_group_light_state(group)?;
        let holds = condition.is_satisfied_by(&state);

        if debug_enabled {
            log_indented!(
                "Condition {} for {}: {} (group is {})",
                condition,
                group,
                if holds { "met" } else { "not met" },
                state
            );
        }

        if !holds {
            return Ok(false);
        }
    }
    Ok(true)
}

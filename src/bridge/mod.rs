//! Light-bridge abstraction.
//!
//! The scheduling engine needs exactly two operations from the lighting
//! controller: set a group's state and read it back. [`LightBridge`] captures
//! that seam so the execution loop can run against the real Hue bridge, the
//! in-memory bridge used by `simulate`, or a mock in tests.
//!
//! ## Implementations
//!
//! - [`hue::HueBridge`]: Philips Hue bridge over its local REST API
//! - [`memory::MemoryBridge`]: in-process state map, used for dry runs

use std::fmt;

use crate::rules::LightState;

pub mod hue;
pub mod memory;

/// Errors surfaced by a light bridge.
#[derive(Debug)]
pub enum BridgeError {
    /// The group name is not known to the bridge
    UnknownGroup(String),
    /// Connection, DNS, timeout or other transport failure
    Transport(String),
    /// Non-success HTTP status
    Http { status: u16, message: String },
    /// The bridge accepted the request but reported an error for it
    Api { address: String, description: String },
    /// The response body could not be decoded
    Decode(serde_json::Error),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::UnknownGroup(name) => write!(f, "unrecognized light group: {name}"),
            BridgeError::Transport(message) => write!(f, "transport error: {message}"),
            BridgeError::Http { status, message } => write!(f, "http {status}: {message}"),
            BridgeError::Api {
                address,
                description,
            } => write!(f, "bridge rejected {address}: {description}"),
            BridgeError::Decode(e) => write!(f, "unexpected response from bridge: {e}"),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BridgeError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(value: serde_json::Error) -> Self {
        BridgeError::Decode(value)
    }
}

/// Operations the execution loop performs against a lighting controller.
#[cfg_attr(test, mockall::automock)]
pub trait LightBridge {
    /// Apply a state to every light in the named group.
    fn set_group_light_state(&mut self, group: &str, state: LightState)
    -> Result<(), BridgeError>;

    /// Read the group's current state.
    ///
    /// Brightness is reported as a percentage rounded down, and is 0 whenever
    /// the group is off.
    fn get_group_light_state(&self, group: &str) -> Result<LightState, BridgeError>;

    /// Human-readable name for logs.
    fn bridge_name(&self) -> &'static str;
}

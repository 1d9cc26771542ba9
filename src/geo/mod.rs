//! Astronomical calculations for solar-triggered rules.
//!
//! - [`solar`]: sunrise/sunset instants for a location and date, and the
//!   "next event after now" resolution shared across a scheduling cycle.
//!
//! Polar day and polar night are a known boundary: when an event does not
//! occur within a few days of the requested date it resolves to `None`, and
//! the rule is left out of the queue until the sun crosses the horizon again.
//! Config loading warns about latitudes beyond ±65°.

pub mod solar;

pub use solar::{SolarTimes, next_event_from, next_sunrise_sunset, solar_event_on};

//! Application-wide constants and defaults.

// # Configuration

/// Directory name under the XDG config home.
pub const CONFIG_DIR_NAME: &str = "lightrules";

/// Configuration file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "lightrules.toml";

// # Geography

pub const MINIMUM_LATITUDE: f64 = -90.0;
pub const MAXIMUM_LATITUDE: f64 = 90.0;
pub const MINIMUM_LONGITUDE: f64 = -180.0;
pub const MAXIMUM_LONGITUDE: f64 = 180.0;

/// Beyond this latitude the sun may not rise or set on some dates.
pub const POLAR_WARNING_LATITUDE: f64 = 65.0;

/// How many additional days the resolver will look ahead for a permitted weekday.
pub const MAX_LOOKAHEAD_DAYS: u32 = 7;

// # Light state

pub const MINIMUM_BRIGHTNESS_PERCENT: u8 = 0;
pub const MAXIMUM_BRIGHTNESS_PERCENT: u8 = 100;

/// Highest brightness value the Hue bridge accepts.
pub const HUE_MAX_BRIGHTNESS: u8 = 254;

// # Simulation

/// Input format for `simulate` start and end times.
pub const SIMULATION_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// # Exit codes

pub const EXIT_FAILURE: i32 = 1;

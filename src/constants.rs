//! Application-wide constants and defaults.

// # Application identity

/// Name used for the config directory and the bridge device type.
pub const APP_NAME: &str = "phlux";
pub const CONFIG_FILE_NAME: &str = "phlux.toml";
pub const CREDENTIALS_FILE_NAME: &str = "credentials.toml";

// # Color temperature targets (Kelvin)

/// Target between sunrise and sunset.
pub const DAY_TEMP: u32 = 6500;
/// Target at any other time.
pub const NIGHT_TEMP: u32 = 1800;

// # Native (mired-like) scale reference points
//
// 153 <=> 6500K
// 500 <=> 2000K
// =============
// 347     4500

pub const NATIVE_COOLEST: f64 = 153.0;
pub const NATIVE_WARMEST: f64 = 500.0;
pub const KELVIN_COOLEST: u32 = 6500;
pub const KELVIN_WARMEST: u32 = 2000;

/// Kelvin per native unit across the reference span (4500 / 347).
pub const KELVIN_PER_NATIVE_UNIT: f64 = 12.968;

// # Configuration defaults

pub const DEFAULT_LATITUDE: f64 = 42.348333;
pub const DEFAULT_LONGITUDE: f64 = -71.1675; // east positive, Boston is west
pub const DEFAULT_INTERVAL: u64 = 300; // seconds

// # Validation limits

pub const MINIMUM_INTERVAL: u64 = 10;
pub const MAXIMUM_INTERVAL: u64 = 86_400;
/// Longest accepted fade, in deciseconds (one hour).
pub const MAXIMUM_TRANSITION_TIME: u16 = 36_000;

// # Bridge HTTP client

pub const DISCOVERY_URL: &str = "https://discovery.meethue.com/";
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Bridge API error type returned when the link button was not pressed.
pub const API_ERROR_LINK_BUTTON: u32 = 101;
/// Bridge API error type returned for an unknown or revoked username.
pub const API_ERROR_UNAUTHORIZED: u32 = 1;

// # Scheduling

/// Granularity of the interruptible sleep between cycles.
pub const SLEEP_SLICE_MILLIS: u64 = 250;

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

//! Configuration for phlux.
//!
//! Settings come from `phlux.toml` in the config directory
//! (`$XDG_CONFIG_HOME/phlux/` unless `--config <dir>` is given) and may be
//! overridden once at startup from the command line:
//!
//! ```toml
//! #[Location]
//! latitude = 42.348333   # Latitude in degrees (-90 to 90)
//! longitude = -71.1675   # Longitude in degrees (-180 to 180)
//!
//! #[Schedule]
//! interval = 300         # Seconds between updates with --forever (10-86400)
//! transition_time = 4    # Fade duration in deciseconds (optional)
//!
//! #[Bridges]
//! bridges = ["192.168.1.20"]  # Skip discovery and use these hosts (optional)
//! ```
//!
//! The loaded [`Config`] is an immutable value handed to each entry point;
//! nothing reads configuration from global state.

pub mod builder;
pub mod loading;
pub mod validation;

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::constants::*;
use crate::geo::GeoCoordinate;

pub use builder::create_default_config;
pub use loading::{ConfigPaths, load, load_from_path};
pub use validation::validate_config;

/// Settings read from `phlux.toml`. Missing fields fall back to defaults.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub interval: Option<u64>, // seconds between cycles
    pub transition_time: Option<u16>, // deciseconds
    /// Bridge hosts to use instead of network discovery.
    pub bridges: Option<Vec<String>>,
}

/// Values given on the command line. Each one replaces the file value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub interval: Option<u64>,
    pub transition_time: Option<u16>,
}

impl Config {
    /// Merge command line overrides and validate the result.
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Result<Self> {
        if overrides.latitude.is_some() {
            self.latitude = overrides.latitude;
        }
        if overrides.longitude.is_some() {
            self.longitude = overrides.longitude;
        }
        if overrides.interval.is_some() {
            self.interval = overrides.interval;
        }
        if overrides.transition_time.is_some() {
            self.transition_time = overrides.transition_time;
        }

        validate_config(&self)?;
        Ok(self)
    }

    pub fn coordinate(&self) -> Result<GeoCoordinate> {
        GeoCoordinate::new(
            self.latitude.unwrap_or(DEFAULT_LATITUDE),
            self.longitude.unwrap_or(DEFAULT_LONGITUDE),
        )
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval.unwrap_or(DEFAULT_INTERVAL))
    }

    pub fn transition_time(&self) -> Option<u16> {
        self.transition_time
    }

    /// Configured bridge hosts; empty means use discovery.
    pub fn bridge_hosts(&self) -> Vec<String> {
        self.bridges
            .iter()
            .flatten()
            .map(|host| host.trim().to_string())
            .filter(|host| !host.is_empty())
            .collect()
    }

    pub fn log_config(&self, paths: &ConfigPaths) {
        log_block_start!("Loaded configuration");
        log_indented!("Config: {}", paths.config_file().display());

        match self.coordinate() {
            Ok(coord) => log_indented!("Location: {coord}"),
            Err(e) => log_indented!("Location: invalid ({e})"),
        }

        log_indented!("Update interval: {} seconds", self.interval().as_secs());

        match self.transition_time {
            Some(ds) => log_indented!("Transition time: {:.1} seconds", f64::from(ds) / 10.0),
            None => log_indented!("Transition time: bridge default"),
        }

        let hosts = self.bridge_hosts();
        if hosts.is_empty() {
            log_indented!("Bridges: discovered on the network");
        } else {
            log_indented!("Bridges: {}", hosts.join(", "));
        }
    }
}

//! Status command: show today's solar events and the current target.
//!
//! Runs the same policy as an update cycle but never contacts a bridge, so
//! it is safe to use for checking a location before pointing phlux at real
//! lights.

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};

use crate::config::{self, CliOverrides, Config, ConfigPaths};
use crate::constants::{NATIVE_COOLEST, NATIVE_WARMEST};
use crate::credentials::{FileCredentialStore, GatewayId};
use crate::geo::{AstronomicalClock, GeoCoordinate, SolarClock};
use crate::temperature::{self, DayPhase, FixtureCapability, Kelvin};

/// Everything the status command prints.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub coordinate: GeoCoordinate,
    pub phase: DayPhase,
    pub kelvin: Kelvin,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    /// Native value on the full reference range.
    pub native: u16,
}

pub fn build_status<Tz: TimeZone>(
    config: &Config,
    clock: &dyn SolarClock,
    now: &DateTime<Tz>,
) -> Result<StatusReport> {
    let coordinate = config.coordinate()?;
    let decision = temperature::evaluate(now, coordinate, clock);
    let reference = FixtureCapability::new(NATIVE_COOLEST as u16, NATIVE_WARMEST as u16);

    Ok(StatusReport {
        coordinate,
        phase: decision.phase,
        kelvin: decision.kelvin,
        sunrise: decision.solar.sunrise,
        sunset: decision.solar.sunset,
        native: temperature::translate(decision.kelvin, reference),
    })
}

fn format_event(event: Option<DateTime<Utc>>) -> String {
    match event {
        Some(instant) => instant.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => "none".to_string(),
    }
}

/// Handle `phlux status`.
pub fn handle_status_command(paths: &ConfigPaths, overrides: &CliOverrides) -> Result<()> {
    let config = config::load(paths)?.with_overrides(overrides)?;
    let report = build_status(&config, &AstronomicalClock, &Local::now())?;

    log_version!();
    log_block_start!("Location: {}", report.coordinate);
    log_indented!("Sunrise: {}", format_event(report.sunrise));
    log_indented!("Sunset:  {}", format_event(report.sunset));
    log_block_start!("{}: {}", report.phase.display_name(), report.kelvin);
    log_indented!("Native value: {}", report.native);

    let store = FileCredentialStore::load(paths.credentials_file())?;
    let ids: Vec<&GatewayId> = store.table().ids().collect();
    if ids.is_empty() {
        log_block_start!("No bridges registered yet");
    } else {
        log_block_start!("Registered bridges:");
        for id in ids {
            log_indented!("{id}");
        }
    }

    log_end!();
    Ok(())
}

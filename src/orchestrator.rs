//! One update cycle across every reachable bridge.
//!
//! The cycle computes a single target temperature, then walks the bridges
//! one after another: authenticate, list fixtures, push the translated
//! native value to every fixture that supports color temperature. A bridge
//! that fails is reported and skipped; only a failed discovery aborts the
//! whole cycle.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};

use crate::auth::{self, AuthState};
use crate::config::Config;
use crate::constants::APP_NAME;
use crate::credentials::CredentialStore;
use crate::gateway::{Gateway, GatewayDiscovery, FixtureState};
use crate::geo::SolarClock;
use crate::temperature::{self, Kelvin, TemperatureDecision};

/// Counters describing what a cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub kelvin: Kelvin,
    pub gateways: usize,
    pub gateways_failed: usize,
    pub fixtures_updated: usize,
    pub fixtures_skipped: usize,
    pub fixtures_failed: usize,
}

impl CycleReport {
    fn new(kelvin: Kelvin, gateways: usize) -> Self {
        Self {
            kelvin,
            gateways,
            gateways_failed: 0,
            fixtures_updated: 0,
            fixtures_skipped: 0,
            fixtures_failed: 0,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.gateways_failed == 0 && self.fixtures_failed == 0
    }
}

/// Run one full cycle at `now`.
///
/// Errors only when discovery fails or finds nothing.
pub fn run_cycle<Tz: TimeZone>(
    discovery: &dyn GatewayDiscovery,
    store: &mut dyn CredentialStore,
    config: &Config,
    clock: &dyn SolarClock,
    now: &DateTime<Tz>,
) -> Result<CycleReport> {
    let coord = config.coordinate()?;
    let decision = temperature::evaluate(now, coord, clock);
    log_decision(&decision);

    let mut gateways = discovery.discover().context("Bridge discovery failed")?;
    if gateways.is_empty() {
        anyhow::bail!("No bridges found");
    }

    let mut report = CycleReport::new(decision.kelvin, gateways.len());

    for gateway in gateways.iter_mut() {
        log_block_start!("Bridge {}", gateway.address());
        if let Err(e) = update_gateway(
            &mut **gateway,
            store,
            decision.kelvin,
            config.transition_time(),
            &mut report,
        ) {
            log_warning!("Skipping bridge {}: {e:#}", gateway.address());
            report.gateways_failed += 1;
        }
    }

    log_block_start!(
        "Updated {} light(s) to {} ({} skipped, {} failed)",
        report.fixtures_updated,
        report.kelvin,
        report.fixtures_skipped,
        report.fixtures_failed
    );

    Ok(report)
}

fn log_decision(decision: &TemperatureDecision) {
    log_block_start!(
        "{}: target {}",
        decision.phase.display_name(),
        decision.kelvin
    );
    match (decision.solar.sunrise, decision.solar.sunset) {
        (Some(sunrise), Some(sunset)) => {
            log_debug!("Sunrise {sunrise}, sunset {sunset}");
        }
        _ => log_indented!("Sun does not rise or set today, treating as night"),
    }
}

fn update_gateway(
    gateway: &mut dyn Gateway,
    store: &mut dyn CredentialStore,
    kelvin: Kelvin,
    transition_time: Option<u16>,
    report: &mut CycleReport,
) -> Result<()> {
    let state = auth::authenticate(gateway, store, APP_NAME)?;
    if !state.is_authenticated() {
        anyhow::bail!("authentication ended in {}", describe_failure(&state));
    }

    let fixtures = gateway
        .list_fixtures()
        .context("Failed to list lights")?;

    for fixture in &fixtures {
        if !fixture.capability.supports_color_temperature() {
            log_debug!("Light {} ({}) has no color temperature range", fixture.id, fixture.name);
            report.fixtures_skipped += 1;
            continue;
        }

        let ct = temperature::translate(kelvin, fixture.capability);
        let state = FixtureState {
            on: fixture.on,
            ct,
            transition_time,
        };

        match gateway.set_fixture_state(fixture, state) {
            Ok(()) => {
                log_indented!("{}: {ct}", fixture.name);
                report.fixtures_updated += 1;
            }
            Err(e) => {
                log_warning!("Failed to update {}: {e:#}", fixture.name);
                report.fixtures_failed += 1;
            }
        }
    }

    Ok(())
}

fn describe_failure(state: &AuthState) -> String {
    match state.failure() {
        Some(reason) => format!("{}: {reason}", state.name()),
        None => state.name().to_string(),
    }
}

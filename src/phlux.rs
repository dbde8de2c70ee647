//! Application runner.
//!
//! `Phlux` loads configuration and credentials, builds the bridge client,
//! and runs either a single update cycle or the periodic loop:
//!
//! - One-shot: `Phlux::new(paths).run()`
//! - Periodic: `Phlux::new(paths).forever(true).run()`

use anyhow::Result;
use chrono::{DateTime, Local};
use std::time::Duration;

use crate::config::{self, CliOverrides, ConfigPaths};
use crate::constants::SLEEP_SLICE_MILLIS;
use crate::credentials::FileCredentialStore;
use crate::gateway::hue::{self, HueDiscovery};
use crate::geo::AstronomicalClock;
use crate::orchestrator::run_cycle;
use crate::signals::ShutdownFlag;
use crate::time_source::{RealTimeSource, TimeSource};

pub struct Phlux {
    paths: ConfigPaths,
    overrides: CliOverrides,
    forever: bool,
}

impl Phlux {
    pub fn new(paths: ConfigPaths) -> Self {
        Self {
            paths,
            overrides: CliOverrides::default(),
            forever: false,
        }
    }

    /// Command line values that replace file settings.
    pub fn with_overrides(mut self, overrides: CliOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Keep running cycles on the configured interval until signalled.
    pub fn forever(mut self, forever: bool) -> Self {
        self.forever = forever;
        self
    }

    pub fn run(self) -> Result<()> {
        log_version!();

        let config = config::load(&self.paths)?.with_overrides(&self.overrides)?;
        config.log_config(&self.paths);

        let mut store = FileCredentialStore::load(self.paths.credentials_file())?;
        let discovery = HueDiscovery::new(hue::build_client()?).with_hosts(config.bridge_hosts());
        let clock = AstronomicalClock;
        let time = RealTimeSource;

        if !self.forever {
            run_cycle(&discovery, &mut store, &config, &clock, &time.now())?;
            log_end!();
            return Ok(());
        }

        let shutdown = ShutdownFlag::register()?;
        run_periodically(config.interval(), &time, &shutdown, |now| {
            run_cycle(&discovery, &mut store, &config, &clock, &now).map(|_| ())
        })?;

        log_block_start!("Shutting down");
        log_end!();
        Ok(())
    }
}

/// Run `cycle` at a fixed rate until `shutdown` is raised.
///
/// Cycles never overlap. A cycle that takes longer than `interval` is
/// followed immediately by the next one. An error from `cycle` stops the
/// loop and is returned.
pub fn run_periodically<F>(
    interval: Duration,
    time: &dyn TimeSource,
    shutdown: &ShutdownFlag,
    mut cycle: F,
) -> Result<usize>
where
    F: FnMut(DateTime<Local>) -> Result<()>,
{
    let mut completed = 0;

    while !shutdown.is_requested() {
        let started = time.now();
        cycle(started)?;
        completed += 1;

        let elapsed = (time.now() - started).to_std().unwrap_or_default();
        match interval.checked_sub(elapsed) {
            Some(remaining) if !remaining.is_zero() => {
                log_debug!("Next update in {} seconds", remaining.as_secs());
                sleep_interruptibly(remaining, time, shutdown);
            }
            _ => log_warning!(
                "Update took {} seconds, longer than the {} second interval",
                elapsed.as_secs(),
                interval.as_secs()
            ),
        }
    }

    Ok(completed)
}

/// Sleep for `duration` in short slices, returning early on shutdown.
fn sleep_interruptibly(duration: Duration, time: &dyn TimeSource, shutdown: &ShutdownFlag) {
    let slice = Duration::from_millis(SLEEP_SLICE_MILLIS);
    let mut remaining = duration;

    while !remaining.is_zero() && !shutdown.is_requested() {
        let step = remaining.min(slice);
        time.sleep(step);
        remaining -= step;
    }
}

//! Day/night color temperature policy.
//!
//! The policy is a binary step: 6500K strictly between sunrise and sunset,
//! 1800K otherwise. There is no dawn or dusk ramp, so lights jump between the
//! two values on the first cycle after each solar event.

use chrono::{DateTime, TimeZone, Utc};

use super::Kelvin;
use crate::constants::{DAY_TEMP, NIGHT_TEMP};
use crate::geo::{GeoCoordinate, SolarClock, SolarTimes};

/// Which side of the solar events an instant falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPhase {
    Day,
    Night,
}

impl DayPhase {
    pub fn temperature(self) -> Kelvin {
        match self {
            DayPhase::Day => Kelvin(DAY_TEMP),
            DayPhase::Night => Kelvin(NIGHT_TEMP),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DayPhase::Day => "Daytime",
            DayPhase::Night => "Nighttime",
        }
    }
}

/// The policy's answer together with the solar events it was based on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureDecision {
    pub phase: DayPhase,
    pub kelvin: Kelvin,
    pub solar: SolarTimes,
}

/// Evaluate the policy for `now` at `coord`.
///
/// Sunrise and sunset are computed for the calendar date of `now` in its own
/// time zone.
pub fn evaluate<Tz: TimeZone>(
    now: &DateTime<Tz>,
    coord: GeoCoordinate,
    clock: &dyn SolarClock,
) -> TemperatureDecision {
    let solar = SolarTimes::compute(clock, now.date_naive(), coord);
    let phase = if solar.contains(now.with_timezone(&Utc)) {
        DayPhase::Day
    } else {
        DayPhase::Night
    };

    TemperatureDecision {
        phase,
        kelvin: phase.temperature(),
        solar,
    }
}

/// Color temperature to apply at `now`.
pub fn desired_temperature<Tz: TimeZone>(
    now: &DateTime<Tz>,
    coord: GeoCoordinate,
    clock: &dyn SolarClock,
) -> Kelvin {
    evaluate(now, coord, clock).kelvin
}

//! Geographic coordinates and sunrise/sunset calculations.
//!
//! The [`SolarClock`] trait is the seam between phlux and the astronomy: the
//! production [`AstronomicalClock`] delegates to the `sunrise` crate, while
//! tests substitute clocks with fixed (or deliberately nonsensical) instants.
//!
//! ## Undefined sunrise/sunset
//!
//! Near the poles the sun may not rise or set on a given date. The
//! astronomical clock reports such events as `None` whenever the computed
//! instant is not a finite, same-day result. Callers never assume that
//! sunrise precedes sunset: daytime is only ever the open interval between
//! the two instants, so a missing, equal or inverted pair always reads as
//! night.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sunrise::{Coordinates, SolarDay, SolarEvent};


/// A validated (latitude, longitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoordinate {
    latitude: f64,
    longitude: f64,
}

impl GeoCoordinate {
    /// Create a coordinate, rejecting values outside ±90° latitude and
    /// ±180° longitude.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            anyhow::bail!("latitude must be between -90 and 90 degrees (got {latitude})");
        }
        if !(-180.0..=180.0).contains(&longitude) {
            anyhow::bail!("longitude must be between -180 and 180 degrees (got {longitude})");
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lat_dir = if self.latitude >= 0.0 { "N" } else { "S" };
        let lon_dir = if self.longitude >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.4}°{}, {:.4}°{}",
            self.latitude.abs(),
            lat_dir,
            self.longitude.abs(),
            lon_dir
        )
    }
}

/// Source of sunrise and sunset instants for a calendar date.
///
/// Both methods are pure functions of their inputs. `None` means the event
/// does not occur (or cannot be computed) on that date.
pub trait SolarClock {
    fn sunrise_at(&self, date: NaiveDate, coord: GeoCoordinate) -> Option<DateTime<Utc>>;
    fn sunset_at(&self, date: NaiveDate, coord: GeoCoordinate) -> Option<DateTime<Utc>>;
}

/// Solar clock backed by the `sunrise` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AstronomicalClock;

impl AstronomicalClock {
    fn event(
        &self,
        date: NaiveDate,
        coord: GeoCoordinate,
        event: SolarEvent,
    ) -> Option<DateTime<Utc>> {
        let coordinates = Coordinates::new(coord.latitude, coord.longitude)?;
        let instant = SolarDay::new(coordinates, date).event_time(event);

        // Polar day/night yields instants drifting far from the requested
        // date; anything more than a day away from it is not a real event.
        let midday = date.and_hms_opt(12, 0, 0)?.and_utc();
        if (instant - midday).abs() > Duration::hours(36) {
            return None;
        }
        Some(instant)
    }
}

impl SolarClock for AstronomicalClock {
    fn sunrise_at(&self, date: NaiveDate, coord: GeoCoordinate) -> Option<DateTime<Utc>> {
        self.event(date, coord, SolarEvent::Sunrise)
    }

    fn sunset_at(&self, date: NaiveDate, coord: GeoCoordinate) -> Option<DateTime<Utc>> {
        self.event(date, coord, SolarEvent::Sunset)
    }
}

/// Sunrise and sunset computed independently for one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarTimes {
    pub date: NaiveDate,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

impl SolarTimes {
    pub fn compute(clock: &dyn SolarClock, date: NaiveDate, coord: GeoCoordinate) -> Self {
        Self {
            date,
            sunrise: clock.sunrise_at(date, coord),
            sunset: clock.sunset_at(date, coord),
        }
    }

    /// Whether `instant` lies strictly after sunrise and strictly before
    /// sunset. Missing events, or a sunset not after sunrise, never contain
    /// any instant.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        match (self.sunrise, self.sunset) {
            (Some(sunrise), Some(sunset)) => sunrise < instant && instant < sunset,
            _ => false,
        }
    }

    /// True when both events exist and sunset comes strictly after sunrise.
    pub fn is_well_ordered(&self) -> bool {
        matches!((self.sunrise, self.sunset), (Some(rise), Some(set)) if rise < set)
    }
}

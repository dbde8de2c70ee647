//! Kelvin to native color temperature mapping.
//!
//! Fixtures expect color temperature on a mired-like integer scale that runs
//! opposite to Kelvin: 153 is the coolest (6500K) and 500 the warmest
//! (2000K) value of the reference range. The mapping is a fixed affine
//! transform through those two points, clamped to whatever sub-range the
//! individual fixture reports.

use serde::Deserialize;

use super::Kelvin;
use crate::constants::{KELVIN_COOLEST, KELVIN_PER_NATIVE_UNIT, NATIVE_COOLEST};

/// Native color temperature range a fixture supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct FixtureCapability {
    pub min: u16,
    pub max: u16,
}

impl FixtureCapability {
    pub fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    /// Fixtures with an empty or inverted range do not support color
    /// temperature and must never be translated for or updated.
    pub fn supports_color_temperature(&self) -> bool {
        self.max > self.min
    }
}

/// Native value for `kelvin` before clamping to any fixture range.
///
/// Exactly 153.0 at 6500K and 500.0 (to within the precision of the
/// constant) at 2000K; decreases as Kelvin increases.
pub fn unclamped_native(kelvin: Kelvin) -> f64 {
    let kelvin_below_coolest = f64::from(KELVIN_COOLEST) - f64::from(kelvin.get());
    NATIVE_COOLEST + kelvin_below_coolest / KELVIN_PER_NATIVE_UNIT
}

/// Map `kelvin` into `capability`'s native range.
///
/// Callers check [`FixtureCapability::supports_color_temperature`] first.
pub fn translate(kelvin: Kelvin, capability: FixtureCapability) -> u16 {
    let min = f64::from(capability.min);
    let max = f64::from(capability.max);
    // max/min rather than clamp: clamp panics when min > max
    unclamped_native(kelvin).max(min).min(max) as u16
}

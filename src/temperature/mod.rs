//! Color temperature decisions and device range mapping.
//!
//! - [`policy`]: picks the Kelvin target for an instant from the sun's position
//! - [`native`]: maps a Kelvin target into a fixture's native integer range

pub mod native;
pub mod policy;

pub use native::{FixtureCapability, translate};
pub use policy::{DayPhase, TemperatureDecision, desired_temperature, evaluate};

/// A color temperature in Kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Kelvin(pub u32);

impl Kelvin {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Kelvin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}K", self.0)
    }
}

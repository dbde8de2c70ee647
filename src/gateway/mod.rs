//! Gateway (bridge) client abstraction.
//!
//! phlux only talks to gateways through the [`Gateway`] and
//! [`GatewayDiscovery`] traits. The production implementation in [`hue`]
//! speaks the Hue bridge HTTP API; tests substitute in-memory fakes.
//!
//! Every method is expected to complete or fail within a bounded time. The
//! HTTP implementation enforces this with a per-request timeout.

use anyhow::Result;

use crate::credentials::{Credential, GatewayId};
use crate::temperature::FixtureCapability;

pub mod hue;

/// Identity information reported by a gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayInfo {
    pub id: GatewayId,
    pub name: Option<String>,
}

/// A light attached to a gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    /// Gateway-local identifier used in state updates.
    pub id: String,
    pub name: String,
    pub kind: String,
    pub on: bool,
    pub capability: FixtureCapability,
}

/// State pushed to a fixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureState {
    pub on: bool,
    /// Native color temperature value.
    pub ct: u16,
    /// Transition duration in deciseconds; `None` leaves the gateway default.
    pub transition_time: Option<u16>,
}

/// A reachable gateway.
#[cfg_attr(test, mockall::automock)]
pub trait Gateway {
    /// Human readable address, used in logs.
    fn address(&self) -> String;

    fn fetch_info(&mut self) -> Result<GatewayInfo>;

    /// Establish a session with an existing credential.
    fn login(&mut self, credential: &Credential) -> Result<()>;

    /// Request a new credential. Only succeeds shortly after the gateway's
    /// link button was pressed.
    fn provision(&mut self, app_name: &str) -> Result<Credential>;

    /// Requires a prior successful `login`.
    fn list_fixtures(&mut self) -> Result<Vec<Fixture>>;

    /// Requires a prior successful `login`.
    fn set_fixture_state(&mut self, fixture: &Fixture, state: FixtureState) -> Result<()>;
}

/// Source of gateways for one update cycle.
pub trait GatewayDiscovery {
    fn discover(&self) -> Result<Vec<Box<dyn Gateway>>>;
}

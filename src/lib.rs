//! # phlux
//!
//! Shifts the color temperature of Hue lights with the sun: cool white
//! between sunrise and sunset, warm white the rest of the time.
//!
//! ## Architecture
//!
//! - **Entry point**: [`Phlux`] loads configuration and runs one cycle or the
//!   periodic loop
//! - **Cycle**: [`orchestrator`] discovers bridges and updates every light
//! - **Authentication**: [`auth`] is the per-bridge login/registration state
//!   machine, backed by [`credentials`]
//! - **Decision**: [`temperature`] picks a Kelvin target from [`geo`] solar
//!   events and maps it into each light's native range
//! - **Bridge access**: [`gateway`] defines the client traits, `gateway::hue`
//!   implements them over HTTP
//! - **Infrastructure**: [`config`], [`args`], [`signals`], [`time_source`]
//!   and the [`logger`]

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod auth;
pub mod commands;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod gateway;
pub mod geo;
pub mod orchestrator;
pub mod signals;
pub mod temperature;
pub mod time_source;

mod phlux;

pub use phlux::{Phlux, run_periodically};

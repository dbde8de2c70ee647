//! One-shot command handlers.
//!
//! Each command lives in its own submodule. None of them talk to a bridge.

pub mod forget;
pub mod status;

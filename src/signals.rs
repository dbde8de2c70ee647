//! Shutdown signal handling.
//!
//! SIGINT, SIGTERM and SIGHUP set a shared flag. The scheduler checks it
//! between cycles and while sleeping; an in-flight cycle always finishes.

use anyhow::{Context, Result};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// A flag that is raised by termination signals.
    pub fn register() -> Result<Self> {
        let flag = Self::new();
        for signal in [SIGINT, SIGTERM, SIGHUP] {
            signal_hook::flag::register(signal, Arc::clone(&flag.requested))
                .with_context(|| format!("Failed to register handler for signal {signal}"))?;
        }
        Ok(flag)
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

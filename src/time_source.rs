//! Time source abstraction.
//!
//! The scheduler asks a [`TimeSource`] for the current time and for sleeps
//! so the periodic loop can be driven by a manual clock in tests.

use chrono::{DateTime, Local};
use std::sync::Mutex;
use std::time::Duration;

pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn sleep(&self, duration: Duration);
}

/// Wall clock time and real sleeps.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A clock that only moves when slept on or advanced explicitly.
pub struct ManualTimeSource {
    current: Mutex<DateTime<Local>>,
    slept: Mutex<Duration>,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            current: Mutex::new(start),
            slept: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, duration: Duration) {
        if let (Ok(mut current), Ok(step)) = (self.current.lock(), chrono::Duration::from_std(duration)) {
            *current += step;
        }
    }

    /// Total time spent in `sleep`.
    pub fn total_slept(&self) -> Duration {
        self.slept.lock().map(|slept| *slept).unwrap_or_default()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Local> {
        match self.current.lock() {
            Ok(current) => *current,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
        if let Ok(mut slept) = self.slept.lock() {
            *slept += duration;
        }
    }
}

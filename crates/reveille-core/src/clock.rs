//! Clock sources.
//!
//! The engine only ever sees the [`Clock`] trait; whether time comes from
//! the OS or a battery-backed RTC is a construction-time decision.

use std::sync::Mutex;

use chrono::{Local, NaiveDateTime};
use tracing::info;

/// A wall-clock time source. Local time, naive -- the schedule is a
/// bedside-clock schedule and DST shifts are not modeled.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// Set the clock. Hardware RTCs accept this; sources that cannot be set
    /// log and ignore it.
    fn set_time(&self, when: NaiveDateTime);
}

/// The operating system's local clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn set_time(&self, when: NaiveDateTime) {
        info!("system clock cannot be set from here, ignoring set_time({when})");
    }
}

/// A settable clock for tests and simulations.
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_time(&self, when: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = when;
    }
}

//! Injected clock for deterministic backoff and debounce timing.
//!
//! Policy and scheduler code never call `Utc::now()` directly; they take a
//! [`Clock`] so tests can pin or advance time explicitly.

use chrono::{DateTime, Utc};

/// A source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The production clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

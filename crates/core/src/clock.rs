//! Injectable time sources.
//!
//! Reconciliation never reads the wall clock directly. An apply pass whose
//! evaluation instant was left undetermined asks a [`Clock`] instead, so
//! tests can pin time with [`FixedClock`].

use std::fmt::Debug;
use std::sync::RwLock;

use chrono::Utc;

use crate::time::Timestamp;

/// A source of the current instant.
pub trait Clock: Send + Sync + Debug {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_datetime(Utc::now())
    }
}

/// A clock that reports a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    at: RwLock<Timestamp>,
}

impl FixedClock {
    /// Create a clock pinned at `at`.
    #[must_use]
    pub const fn new(at: Timestamp) -> Self {
        Self {
            at: RwLock::new(at),
        }
    }

    /// Move the clock to `at`.
    pub fn set(&self, at: Timestamp) {
        match self.at.write() {
            Ok(mut guard) => *guard = at,
            Err(poisoned) => *poisoned.into_inner() = at,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        match self.at.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

//! Time source for record timestamps.

use std::sync::Mutex;

use chrono::{DateTime, Duration, SubsecRound, Utc};

/// Source of "now" for newly created records.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<C> Clock for std::sync::Arc<C>
where
    C: Clock + ?Sized,
{
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Wall clock, truncated to microseconds (the precision of `TIMESTAMPTZ`).
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }
}

/// Deterministic clock for tests/dev.
///
/// Returns the configured instant, optionally advancing by `step` after every read.
#[derive(Debug)]
pub struct FixedClock {
    current: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl FixedClock {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(instant),
            step: Duration::zero(),
        }
    }

    pub fn stepping(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current: Mutex::new(start),
            step,
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        if let Ok(mut current) = self.current.lock() {
            *current = instant;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.current.lock() {
            Ok(mut current) => {
                let now = *current;
                *current = now + self.step;
                now
            }
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

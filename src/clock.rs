//! Monotonic and wall-clock time sources for the driver loop.

use std::time::Instant;

use chrono::{DateTime, Local};

/// Time source for the driver.
///
/// `now` feeds the debouncer and must be monotonic; `wall` only stamps log lines.
pub trait Clock {
    fn now(&self) -> Instant;
    fn wall(&self) -> DateTime<Local>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Local> {
        Local::now()
    }
}

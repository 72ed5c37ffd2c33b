//! Wall-clock source for header timestamps.

use super::header::HeaderFlags;
use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// A source of the current instant.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant, for reproducible output.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Express `instant` in the zone selected by `flags`.
pub fn wall_time(instant: DateTime<Utc>, flags: HeaderFlags) -> NaiveDateTime {
    if flags.contains(HeaderFlags::UTC) {
        instant.naive_utc()
    } else {
        instant.with_timezone(&Local).naive_local()
    }
}

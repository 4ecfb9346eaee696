//! Simulation time types.
//!
//! The engine tracks a TAI-based monotonic clock as a `(seconds, nanoseconds)`
//! pair. [`MonotonicTime`] is an absolute point on that clock,
//! [`Duration`] a non-negative span, and [`Deadline`] the union of the two
//! accepted by scheduling and stepping calls.

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// An absolute timestamp on the simulation clock.
///
/// The nanosecond part is always in `0..1_000_000_000`; constructors
/// normalize any overflow into the seconds part.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MonotonicTime {
    secs: i64,
    nanos: u32,
}

impl MonotonicTime {
    /// The 1970-01-01 00:00:00 TAI epoch.
    pub const EPOCH: MonotonicTime = MonotonicTime { secs: 0, nanos: 0 };

    /// Creates a timestamp from seconds and nanoseconds since the epoch.
    pub fn new(secs: i64, nanos: u32) -> Self {
        Self {
            secs: secs + i64::from(nanos / NANOS_PER_SEC),
            nanos: nanos % NANOS_PER_SEC,
        }
    }

    /// Whole seconds since the epoch.
    pub fn secs(&self) -> i64 {
        self.secs
    }

    /// Sub-second nanoseconds.
    pub fn nanos(&self) -> u32 {
        self.nanos
    }
}

impl fmt::Display for MonotonicTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}s", self.secs, self.nanos)
    }
}

impl Add<Duration> for MonotonicTime {
    type Output = MonotonicTime;

    fn add(self, rhs: Duration) -> MonotonicTime {
        let nanos = self.nanos + rhs.nanos;
        // Saturate rather than wrap: a span too large for the clock pins the
        // result to the end of time.
        let secs = i64::try_from(rhs.secs)
            .unwrap_or(i64::MAX)
            .saturating_add(self.secs)
            .saturating_add(i64::from(nanos / NANOS_PER_SEC));
        MonotonicTime {
            secs,
            nanos: nanos % NANOS_PER_SEC,
        }
    }
}

/// A non-negative span of simulation time.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Duration {
    secs: u64,
    nanos: u32,
}

impl Duration {
    /// Creates a duration from seconds and nanoseconds, normalizing overflow.
    pub fn new(secs: u64, nanos: u32) -> Self {
        Self {
            secs: secs + u64::from(nanos / NANOS_PER_SEC),
            nanos: nanos % NANOS_PER_SEC,
        }
    }

    /// Creates a duration of whole seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self { secs, nanos: 0 }
    }

    /// Creates a duration of milliseconds.
    pub fn from_millis(millis: u64) -> Self {
        Self::new(millis / 1_000, (millis % 1_000) as u32 * 1_000_000)
    }

    /// Whole seconds.
    pub fn secs(&self) -> u64 {
        self.secs
    }

    /// Sub-second nanoseconds.
    pub fn nanos(&self) -> u32 {
        self.nanos
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}s", self.secs, self.nanos)
    }
}

/// A target time for stepping or scheduling: either an absolute timestamp or
/// a span relative to the current simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deadline {
    /// An absolute time on the simulation clock.
    Time(MonotonicTime),
    /// A strictly positive span from the current simulation time.
    Duration(Duration),
}

impl From<MonotonicTime> for Deadline {
    fn from(time: MonotonicTime) -> Self {
        Deadline::Time(time)
    }
}

impl From<Duration> for Deadline {
    fn from(duration: Duration) -> Self {
        Deadline::Duration(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_normalize_nanosecond_overflow() {
        let t = MonotonicTime::new(1, 2_500_000_000);
        assert_eq!(t.secs(), 3);
        assert_eq!(t.nanos(), 500_000_000);

        let d = Duration::from_millis(1_250);
        assert_eq!(d.secs(), 1);
        assert_eq!(d.nanos(), 250_000_000);
    }

    #[test]
    fn add_duration_carries_into_seconds() {
        let t = MonotonicTime::new(2, 800_000_000) + Duration::new(0, 300_000_000);
        assert_eq!(t, MonotonicTime::new(3, 100_000_000));
    }

    #[test]
    fn adding_an_oversized_duration_saturates() {
        let t = MonotonicTime::new(1, 0) + Duration::from_secs(u64::MAX);
        assert_eq!(t.secs(), i64::MAX);

        let t = MonotonicTime::new(i64::MAX, 900_000_000) + Duration::new(0, 200_000_000);
        assert_eq!(t.secs(), i64::MAX);
        assert_eq!(t.nanos(), 100_000_000);
    }

    #[test]
    fn display_is_fixed_width() {
        assert_eq!(MonotonicTime::new(3, 7).to_string(), "3.000000007s");
    }
}

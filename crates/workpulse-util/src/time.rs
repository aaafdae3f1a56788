//! Time utilities for workpulse
//!
//! Provides monotonic time (for measuring session length), wall-clock time
//! (for the per-day ledger and envelope timestamps), a [`Clock`] abstraction so
//! the state machine can be driven deterministically in tests, and the
//! [`ElapsedTime`] `MM:SS` value shared by the timer and the ledger.

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::ElapsedParseError;

/// Get the current local time.
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Represents a point in monotonic time for measuring session length.
/// This is immune to wall-clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    /// Returns the duration since `earlier`, or zero if `earlier` is later than `self`
    pub fn duration_since(&self, earlier: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }
}

impl std::ops::Add<Duration> for MonotonicInstant {
    type Output = MonotonicInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        MonotonicInstant(self.0 + rhs)
    }
}

/// Source of "now" for the state machine and ledger.
pub trait Clock: Send + Sync {
    /// Current wall-clock time (local timezone)
    fn now(&self) -> DateTime<Local>;

    /// Current monotonic instant
    fn now_mono(&self) -> MonotonicInstant;
}

/// The real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        now()
    }

    fn now_mono(&self) -> MonotonicInstant {
        MonotonicInstant::now()
    }
}

/// A clock that only moves when told to.
///
/// Wall and monotonic time advance together, so elapsed-time calculations
/// and the ledger's "today" stay consistent.
#[derive(Debug)]
pub struct ManualClock {
    inner: Mutex<(DateTime<Local>, MonotonicInstant)>,
}

impl ManualClock {
    /// Start at the current real time
    pub fn new() -> Self {
        Self::starting_at(now())
    }

    /// Start at a fixed wall-clock time
    pub fn starting_at(wall: DateTime<Local>) -> Self {
        Self {
            inner: Mutex::new((wall, MonotonicInstant::now())),
        }
    }

    /// Move both wall and monotonic time forward
    pub fn advance(&self, by: Duration) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
        inner.0 += delta;
        inner.1 = inner.1 + by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).0
    }

    fn now_mono(&self) -> MonotonicInstant {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).1
    }
}

/// Whole seconds of work, displayed as zero-padded `MM:SS`.
///
/// Minutes are not wrapped into hours: 90 minutes is `90:00`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElapsedTime(u64);

impl ElapsedTime {
    pub const ZERO: ElapsedTime = ElapsedTime(0);

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Truncates to whole seconds
    pub fn from_duration(d: Duration) -> Self {
        Self(d.as_secs())
    }

    /// Whole seconds between two monotonic instants
    pub fn between(start: MonotonicInstant, now: MonotonicInstant) -> Self {
        Self::from_duration(now.duration_since(start))
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn minutes(&self) -> u64 {
        self.0 / 60
    }

    pub fn seconds(&self) -> u64 {
        self.0 % 60
    }
}

impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes(), self.seconds())
    }
}

impl FromStr for ElapsedTime {
    type Err = ElapsedParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min_str, sec_str) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| ElapsedParseError::InvalidFormat(s.to_string()))?;

        let is_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

        if !is_digits(min_str) {
            return Err(ElapsedParseError::InvalidMinutes(s.to_string()));
        }
        if !is_digits(sec_str) {
            return Err(ElapsedParseError::InvalidSeconds(s.to_string()));
        }

        let minutes: u64 = min_str
            .parse()
            .map_err(|_| ElapsedParseError::InvalidMinutes(s.to_string()))?;
        let seconds: u64 = sec_str
            .parse()
            .map_err(|_| ElapsedParseError::InvalidSeconds(s.to_string()))?;

        if seconds >= 60 {
            return Err(ElapsedParseError::SecondsOutOfRange(s.to_string()));
        }

        minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds))
            .map(ElapsedTime)
            .ok_or_else(|| ElapsedParseError::InvalidMinutes(s.to_string()))
    }
}

impl Serialize for ElapsedTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ElapsedTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

//! Work session tracking

use chrono::{DateTime, Local};
use workpulse_util::{ElapsedTime, MonotonicInstant};

/// The single active work session
#[derive(Debug, Clone)]
pub struct WorkSession {
    /// Wall-clock start time (for display/logging)
    pub started_at: DateTime<Local>,

    /// Monotonic start time (for elapsed computation)
    pub started_at_mono: MonotonicInstant,

    /// Last computed elapsed time
    elapsed: ElapsedTime,
}

impl WorkSession {
    pub fn new(now: DateTime<Local>, now_mono: MonotonicInstant) -> Self {
        Self {
            started_at: now,
            started_at_mono: now_mono,
            elapsed: ElapsedTime::ZERO,
        }
    }

    /// Recompute elapsed time from the clock. Never goes backwards.
    pub fn update(&mut self, now_mono: MonotonicInstant) -> ElapsedTime {
        let measured = ElapsedTime::between(self.started_at_mono, now_mono);
        self.elapsed = self.elapsed.max(measured);
        self.elapsed
    }

    pub fn elapsed(&self) -> ElapsedTime {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_elapsed_floors_to_seconds() {
        let start = MonotonicInstant::now();
        let mut session = WorkSession::new(workpulse_util::now(), start);

        assert_eq!(session.elapsed(), ElapsedTime::ZERO);
        let elapsed = session.update(start + Duration::from_millis(2_999));
        assert_eq!(elapsed.as_secs(), 2);
    }

    #[test]
    fn test_elapsed_is_monotonic() {
        let start = MonotonicInstant::now();
        let mut session = WorkSession::new(workpulse_util::now(), start);

        session.update(start + Duration::from_secs(10));
        // A stale instant cannot move the timer back
        let elapsed = session.update(start + Duration::from_secs(3));
        assert_eq!(elapsed.as_secs(), 10);
    }
}

//! Work-timer state machine

use chrono::{DateTime, Local, NaiveDate};
use std::sync::Arc;
use tracing::{debug, info, warn};
use workpulse_api::{DailySnapshot, WorkTimerView};
use workpulse_store::Ledger;
use workpulse_util::{ElapsedTime, MonotonicInstant};

use crate::{CoreEvent, MarkerClassifier, WorkSession};

/// Idle/Active work timer.
///
/// Time is always passed in by the caller so transitions are deterministic.
pub struct WorkTimer {
    classifier: MarkerClassifier,
    ledger: Arc<dyn Ledger>,
    session: Option<WorkSession>,
}

impl WorkTimer {
    pub fn new(classifier: MarkerClassifier, ledger: Arc<dyn Ledger>) -> Self {
        info!(
            start_marker = classifier.start_marker(),
            complete_marker = classifier.complete_marker(),
            "Work timer initialized"
        );

        Self {
            classifier,
            ledger,
            session: None,
        }
    }

    /// Apply a status text
    pub fn on_status(
        &mut self,
        text: &str,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Vec<CoreEvent> {
        let marks = self.classifier.classify(text);

        let Some(session) = self.session.as_mut() else {
            if marks.start {
                return self.start_session(now, now_mono);
            }
            debug!(status = text, "Idle, status ignored");
            return vec![];
        };

        if marks.complete {
            let final_duration = session.update(now_mono);
            self.session = None;
            return self.complete_session(final_duration, now.date_naive());
        }

        if marks.start {
            debug!(status = text, "Session already active");
            return vec![];
        }

        let elapsed = session.update(now_mono);
        self.session = None;
        info!(elapsed = %elapsed, "Session abandoned, not recorded");
        vec![CoreEvent::SessionAbandoned { elapsed }]
    }

    /// Periodic tick while active
    pub fn tick(&mut self, now_mono: MonotonicInstant) -> Option<CoreEvent> {
        let session = self.session.as_mut()?;
        let elapsed = session.update(now_mono);
        Some(CoreEvent::TimerUpdate(WorkTimerView::running(elapsed)))
    }

    pub fn is_working(&self) -> bool {
        self.session.is_some()
    }

    pub fn elapsed(&self) -> ElapsedTime {
        self.session
            .as_ref()
            .map(|s| s.elapsed())
            .unwrap_or(ElapsedTime::ZERO)
    }

    /// Current timer view, if a session is active
    pub fn timer_snapshot(&self) -> Option<WorkTimerView> {
        self.session
            .as_ref()
            .map(|s| WorkTimerView::running(s.elapsed()))
    }

    pub fn today_stats(&self, today: NaiveDate) -> DailySnapshot {
        self.ledger.today_stats(today)
    }

    pub fn ledger_healthy(&self) -> bool {
        self.ledger.is_healthy()
    }

    fn start_session(&mut self, now: DateTime<Local>, now_mono: MonotonicInstant) -> Vec<CoreEvent> {
        self.session = Some(WorkSession::new(now, now_mono));
        info!(started_at = %now, "Work session started");

        vec![
            CoreEvent::SessionStarted { started_at: now },
            CoreEvent::TimerUpdate(WorkTimerView::running(ElapsedTime::ZERO)),
        ]
    }

    fn complete_session(&mut self, final_duration: ElapsedTime, today: NaiveDate) -> Vec<CoreEvent> {
        info!(duration = %final_duration, "Work session completed");

        let snapshot = match self.ledger.record_session(today, final_duration) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Failed to persist session, keeping in-memory stats");
                self.ledger.today_stats(today)
            }
        };

        vec![
            CoreEvent::TimerUpdate(WorkTimerView::completed(final_duration)),
            CoreEvent::StatsUpdated(snapshot),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;
    use workpulse_store::JsonLedger;
    use workpulse_util::{Clock, ManualClock};

    fn make_timer() -> (WorkTimer, Arc<JsonLedger>, ManualClock) {
        let ledger = Arc::new(JsonLedger::in_memory());
        let timer = WorkTimer::new(MarkerClassifier::default(), ledger.clone());
        let clock = ManualClock::starting_at(Local.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap());
        (timer, ledger, clock)
    }

    fn status(timer: &mut WorkTimer, clock: &ManualClock, text: &str) -> Vec<CoreEvent> {
        timer.on_status(text, clock.now(), clock.now_mono())
    }

    fn today(clock: &ManualClock) -> NaiveDate {
        clock.now().date_naive()
    }

    #[test]
    fn test_start_emits_immediate_tick() {
        let (mut timer, _, clock) = make_timer();

        let events = status(&mut timer, &clock, "working");
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], CoreEvent::SessionStarted { .. }));
        assert_eq!(
            events[1],
            CoreEvent::TimerUpdate(WorkTimerView::running(ElapsedTime::ZERO))
        );
        assert!(timer.is_working());
    }

    #[test]
    fn test_idle_ignores_other_text() {
        let (mut timer, _, clock) = make_timer();

        assert!(status(&mut timer, &clock, "thinking").is_empty());
        assert!(!timer.is_working());
        assert!(timer.tick(clock.now_mono()).is_none());
    }

    #[test]
    fn test_idle_complete_is_noop() {
        let (mut timer, ledger, clock) = make_timer();

        assert!(status(&mut timer, &clock, "work complete").is_empty());
        assert!(ledger.get_record(today(&clock)).is_none());
    }

    #[test]
    fn test_start_while_active_is_noop() {
        let (mut timer, _, clock) = make_timer();
        status(&mut timer, &clock, "working");

        clock.advance(Duration::from_secs(5));
        timer.tick(clock.now_mono());

        assert!(status(&mut timer, &clock, "still working").is_empty());
        assert!(timer.is_working());
        // Not reset
        assert_eq!(timer.elapsed().as_secs(), 5);
    }

    #[test]
    fn test_ticks_increase() {
        let (mut timer, _, clock) = make_timer();
        status(&mut timer, &clock, "working");

        let mut last = ElapsedTime::ZERO;
        for _ in 0..3 {
            clock.advance(Duration::from_secs(1));
            let Some(CoreEvent::TimerUpdate(view)) = timer.tick(clock.now_mono()) else {
                panic!("expected timer update");
            };
            assert!(view.is_working);
            assert!(!view.is_completed);
            assert!(view.elapsed_time > last);
            last = view.elapsed_time;
        }
        assert_eq!(last.to_string(), "00:03");
    }

    #[test]
    fn test_abandon_does_not_record() {
        let (mut timer, ledger, clock) = make_timer();
        status(&mut timer, &clock, "working");
        clock.advance(Duration::from_secs(42));

        let events = status(&mut timer, &clock, "waiting for input");
        assert_eq!(
            events,
            vec![CoreEvent::SessionAbandoned {
                elapsed: ElapsedTime::from_secs(42)
            }]
        );
        assert!(!timer.is_working());
        assert!(timer.tick(clock.now_mono()).is_none());
        assert!(ledger.get_record(today(&clock)).is_none());
    }

    #[test]
    fn test_both_markers_depend_on_state() {
        let (mut timer, ledger, clock) = make_timer();
        let text = "working -> work complete";

        // Idle: start wins
        let events = status(&mut timer, &clock, text);
        assert!(matches!(events[0], CoreEvent::SessionStarted { .. }));

        // Active: complete wins
        clock.advance(Duration::from_secs(7));
        let events = status(&mut timer, &clock, text);
        assert_eq!(
            events[0],
            CoreEvent::TimerUpdate(WorkTimerView::completed(ElapsedTime::from_secs(7)))
        );
        assert_eq!(ledger.get_record(today(&clock)).unwrap().count, 1);
    }

    #[test]
    fn test_final_duration_uses_clock() {
        let (mut timer, _, clock) = make_timer();
        status(&mut timer, &clock, "working");

        clock.advance(Duration::from_secs(2));
        timer.tick(clock.now_mono());
        // No tick between here and completion
        clock.advance(Duration::from_millis(1_600));

        let events = status(&mut timer, &clock, "work complete");
        assert_eq!(
            events[0],
            CoreEvent::TimerUpdate(WorkTimerView::completed(ElapsedTime::from_secs(3)))
        );
    }

    #[test]
    fn test_ninety_second_session() {
        let (mut timer, ledger, clock) = make_timer();
        status(&mut timer, &clock, "working");

        for second in 1..=90 {
            clock.advance(Duration::from_secs(1));
            let event = timer.tick(clock.now_mono());
            assert_eq!(
                event,
                Some(CoreEvent::TimerUpdate(WorkTimerView::running(
                    ElapsedTime::from_secs(second)
                )))
            );
        }

        let events = status(&mut timer, &clock, "work complete");
        assert_eq!(events.len(), 2);

        let CoreEvent::TimerUpdate(final_view) = &events[0] else {
            panic!("expected final timer update");
        };
        assert!(final_view.is_completed);
        assert!(!final_view.is_working);
        assert_eq!(final_view.elapsed_time.to_string(), "01:30");

        let CoreEvent::StatsUpdated(stats) = &events[1] else {
            panic!("expected stats update");
        };
        assert_eq!(stats.today_count, 1);
        assert_eq!(stats.today_duration.to_string(), "01:30");

        let record = ledger.get_record(today(&clock)).unwrap();
        assert_eq!(record.count, 1);
        assert_eq!(record.total_duration, 90);
        assert!(!timer.is_working());
    }

    #[test]
    fn test_persist_failure_still_reports_stats() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        let ledger = Arc::new(JsonLedger::open(blocker.join("work_stats.json")));
        let mut timer = WorkTimer::new(MarkerClassifier::default(), ledger.clone());
        let clock = ManualClock::new();

        status(&mut timer, &clock, "working");
        clock.advance(Duration::from_secs(12));
        let events = status(&mut timer, &clock, "work complete");

        let CoreEvent::StatsUpdated(stats) = &events[1] else {
            panic!("expected stats update");
        };
        assert_eq!(stats.today_count, 1);
        assert_eq!(stats.today_duration.as_secs(), 12);
        assert!(!timer.ledger_healthy());
    }

    #[test]
    fn test_at_most_one_session() {
        let (mut timer, _, clock) = make_timer();
        let inputs = ["working", "working", "x", "working", "work complete", "work complete"];

        let mut started = 0;
        for text in inputs {
            for event in status(&mut timer, &clock, text) {
                if matches!(event, CoreEvent::SessionStarted { .. }) {
                    started += 1;
                    assert_eq!(started, 1, "a second session started while active");
                }
                if matches!(
                    event,
                    CoreEvent::SessionAbandoned { .. } | CoreEvent::StatsUpdated(_)
                ) {
                    started = 0;
                }
            }
        }
    }
}

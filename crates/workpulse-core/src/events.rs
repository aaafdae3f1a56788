//! Core events emitted by the engine

use chrono::{DateTime, Local};
use workpulse_api::{DailySnapshot, WorkTimerView};
use workpulse_util::ElapsedTime;

/// Events from the core engine
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// Idle -> Active
    SessionStarted { started_at: DateTime<Local> },

    /// Timer state to broadcast as `work_timer_update`
    TimerUpdate(WorkTimerView),

    /// Ledger snapshot to broadcast as `work_stats_update`
    StatsUpdated(DailySnapshot),

    /// Active -> Idle without completion; nothing is recorded
    SessionAbandoned { elapsed: ElapsedTime },
}

//! Shared snapshot types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use workpulse_util::ElapsedTime;

/// Today's completed-work totals, as broadcast in `work_stats_update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySnapshot {
    pub today_count: u32,
    pub today_duration: ElapsedTime,
    pub date: NaiveDate,
}

impl DailySnapshot {
    /// Snapshot for a day with no completed sessions
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            today_count: 0,
            today_duration: ElapsedTime::ZERO,
            date,
        }
    }
}

/// Work timer state, as broadcast in `work_timer_update`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkTimerView {
    pub is_working: bool,
    pub is_completed: bool,
    pub elapsed_time: ElapsedTime,
}

impl WorkTimerView {
    /// A running session
    pub fn running(elapsed_time: ElapsedTime) -> Self {
        Self {
            is_working: true,
            is_completed: false,
            elapsed_time,
        }
    }

    /// A session that just completed with its final duration
    pub fn completed(elapsed_time: ElapsedTime) -> Self {
        Self {
            is_working: false,
            is_completed: true,
            elapsed_time,
        }
    }
}

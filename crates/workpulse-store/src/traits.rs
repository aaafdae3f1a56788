//! Store trait definitions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use workpulse_api::DailySnapshot;
use workpulse_util::ElapsedTime;

use crate::StoreResult;

/// Work session ledger
pub trait Ledger: Send + Sync {
    /// Record one completed session on `day`.
    ///
    /// On a persistence failure the in-memory record is still updated and
    /// remains authoritative; the error is returned so the caller can log it.
    fn record_session(&self, day: NaiveDate, duration: ElapsedTime) -> StoreResult<DailySnapshot>;

    /// Stats for `day`, zeroed when nothing has been recorded
    fn today_stats(&self, day: NaiveDate) -> DailySnapshot;

    /// Raw record for a day, if any
    fn get_record(&self, day: NaiveDate) -> Option<DailyWorkRecord>;

    /// Whether the last write reached disk
    fn is_healthy(&self) -> bool;
}

/// Completed work for a single calendar day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWorkRecord {
    pub count: u32,
    /// Seconds
    pub total_duration: u64,
}

impl DailyWorkRecord {
    pub fn snapshot(&self, date: NaiveDate) -> DailySnapshot {
        DailySnapshot {
            today_count: self.count,
            today_duration: ElapsedTime::from_secs(self.total_duration),
            date,
        }
    }
}

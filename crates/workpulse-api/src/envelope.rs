//! Envelope types for workpulsed -> subscriber streaming

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use workpulse_util::ElapsedTime;

use crate::{DailySnapshot, WorkTimerView};

/// Greeting sent to every new subscriber
pub const CONNECTION_ESTABLISHED_MESSAGE: &str = "连接成功";

/// Envelope wrapping every push-channel message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub payload: EnvelopePayload,
    pub timestamp: DateTime<Local>,
}

impl Envelope {
    pub fn new(payload: EnvelopePayload, timestamp: DateTime<Local>) -> Self {
        Self { payload, timestamp }
    }

    /// Envelope stamped with the current time
    pub fn now(payload: EnvelopePayload) -> Self {
        Self::new(payload, workpulse_util::now())
    }

    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}

/// All possible messages from the service to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EnvelopePayload {
    /// First message on every new subscription
    ConnectionEstablished { message: String },

    /// Raw status text received over HTTP
    StatusUpdate { status: String },

    /// Work timer tick, completion, or late-joiner snapshot
    WorkTimerUpdate(WorkTimerView),

    /// Today's totals (on subscribe and after every completed session)
    WorkStatsUpdate(DailySnapshot),

    /// Reply to a subscriber's ping
    Pong,
}

impl EnvelopePayload {
    pub fn connection_established() -> Self {
        Self::ConnectionEstablished {
            message: CONNECTION_ESTABLISHED_MESSAGE.to_string(),
        }
    }

    pub fn timer_running(elapsed: ElapsedTime) -> Self {
        Self::WorkTimerUpdate(WorkTimerView::running(elapsed))
    }

    pub fn timer_completed(elapsed: ElapsedTime) -> Self {
        Self::WorkTimerUpdate(WorkTimerView::completed(elapsed))
    }

    /// Wire name of the envelope type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished { .. } => "connection_established",
            Self::StatusUpdate { .. } => "status_update",
            Self::WorkTimerUpdate(_) => "work_timer_update",
            Self::WorkStatsUpdate(_) => "work_stats_update",
            Self::Pong => "pong",
        }
    }
}

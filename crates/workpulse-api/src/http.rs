//! HTTP response bodies for the status ingress

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use workpulse_util::ElapsedTime;

/// Success message returned by `GET /status`
pub const STATUS_ACCEPTED_MESSAGE: &str = "状态更新成功";

/// Stable classification string carried by every error body
pub const ERROR_CLASSIFICATION: &str = "格式错误";

/// Message for a missing or empty `cursor_status` parameter
pub const MISSING_STATUS_MESSAGE: &str = "缺少cursor_status参数";

/// Message for any internal fault
pub const INTERNAL_ERROR_MESSAGE: &str = "服务器内部错误";

/// `GET /status` success body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusAck {
    pub success: bool,
    pub message: String,
    pub received_status: String,
}

impl StatusAck {
    pub fn new(received_status: impl Into<String>) -> Self {
        Self {
            success: true,
            message: STATUS_ACCEPTED_MESSAGE.to_string(),
            received_status: received_status.into(),
        }
    }
}

/// Error body for every non-2xx response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ERROR_CLASSIFICATION.to_string(),
            message: message.into(),
        }
    }
}

/// Engine liveness as seen by the service loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub connected_clients: usize,
    pub is_working: bool,
    pub work_elapsed_time: ElapsedTime,
    /// Whether the last ledger write reached disk
    pub ledger_healthy: bool,
}

/// `GET /health` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: DateTime<Local>,
    pub connected_clients: usize,
    pub is_working: bool,
    pub work_elapsed_time: ElapsedTime,
    pub ledger_healthy: bool,
}

impl HealthReport {
    pub fn ok(snapshot: HealthSnapshot, timestamp: DateTime<Local>) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp,
            connected_clients: snapshot.connected_clients,
            is_working: snapshot.is_working,
            work_elapsed_time: snapshot.work_elapsed_time,
            ledger_healthy: snapshot.ledger_healthy,
        }
    }
}

/// `GET /network` body: the preferred local adapter, or nulls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub mac: Option<String>,
    pub ipv4: Option<Ipv4Addr>,
}

/// `GET /ports` body: where the two listeners actually bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    pub http_addr: SocketAddr,
    pub push_addr: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_shape() {
        let json = serde_json::to_value(ErrorBody::new(MISSING_STATUS_MESSAGE)).unwrap();
        assert_eq!(json["error"], "格式错误");
        assert_eq!(json["message"], "缺少cursor_status参数");
    }

    #[test]
    fn health_report_shape() {
        let report = HealthReport::ok(
            HealthSnapshot {
                connected_clients: 2,
                is_working: true,
                work_elapsed_time: ElapsedTime::from_secs(61),
                ledger_healthy: false,
            },
            workpulse_util::now(),
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["connected_clients"], 2);
        assert_eq!(json["is_working"], true);
        assert_eq!(json["work_elapsed_time"], "01:01");
        assert_eq!(json["ledger_healthy"], false);
    }

    #[test]
    fn port_info_shape() {
        let info = PortInfo {
            http_addr: "127.0.0.1:4090".parse().unwrap(),
            push_addr: None,
        };

        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["http_addr"], "127.0.0.1:4090");
        assert!(json["push_addr"].is_null());
    }

    #[test]
    fn empty_network_info_serializes_nulls() {
        let json = serde_json::to_value(NetworkInfo::default()).unwrap();
        assert!(json["mac"].is_null());
        assert!(json["ipv4"].is_null());
    }
}

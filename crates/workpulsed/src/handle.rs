//! Channel-backed handle into the service loop

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use workpulse_api::{DailySnapshot, HealthSnapshot, NetworkInfo, PortInfo};
use workpulse_http::{IngressError, IngressResult, StatusBackend};

/// Request from the HTTP layer to the service loop
#[derive(Debug)]
pub enum ServiceRequest {
    SubmitStatus {
        status: String,
        reply: oneshot::Sender<()>,
    },
    Health {
        reply: oneshot::Sender<HealthSnapshot>,
    },
    TodayStats {
        reply: oneshot::Sender<DailySnapshot>,
    },
    Ports {
        reply: oneshot::Sender<PortInfo>,
    },
}

/// Cloneable sender side used by the HTTP handlers
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    tx: mpsc::UnboundedSender<ServiceRequest>,
}

impl ServiceHandle {
    pub fn new(tx: mpsc::UnboundedSender<ServiceRequest>) -> Self {
        Self { tx }
    }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> ServiceRequest) -> IngressResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| IngressError::Internal("service loop is not running".into()))?;
        rx.await
            .map_err(|_| IngressError::Internal("service dropped the request".into()))
    }
}

#[async_trait]
impl StatusBackend for ServiceHandle {
    async fn submit_status(&self, status: String) -> IngressResult<()> {
        self.call(|reply| ServiceRequest::SubmitStatus { status, reply })
            .await
    }

    async fn health(&self) -> IngressResult<HealthSnapshot> {
        self.call(|reply| ServiceRequest::Health { reply }).await
    }

    async fn today_stats(&self) -> IngressResult<DailySnapshot> {
        self.call(|reply| ServiceRequest::TodayStats { reply }).await
    }

    async fn network(&self) -> IngressResult<NetworkInfo> {
        // Pure host query, no service state involved
        tokio::task::spawn_blocking(workpulse_net::select_best_adapter)
            .await
            .map_err(|e| IngressError::Internal(e.to_string()))
    }

    async fn ports(&self) -> IngressResult<PortInfo> {
        self.call(|reply| ServiceRequest::Ports { reply }).await
    }
}

//! Service seam for the HTTP layer

use async_trait::async_trait;
use workpulse_api::{DailySnapshot, HealthSnapshot, NetworkInfo, PortInfo};

use crate::IngressResult;

/// What the HTTP handlers need from the service
#[async_trait]
pub trait StatusBackend: Send + Sync {
    /// Apply a status text and broadcast it. Resolves once the service has
    /// processed it.
    async fn submit_status(&self, status: String) -> IngressResult<()>;

    async fn health(&self) -> IngressResult<HealthSnapshot>;

    async fn today_stats(&self) -> IngressResult<DailySnapshot>;

    async fn network(&self) -> IngressResult<NetworkInfo>;

    /// Bound listener addresses
    async fn ports(&self) -> IngressResult<PortInfo>;
}

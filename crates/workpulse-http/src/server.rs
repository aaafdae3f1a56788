//! axum router and listener

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router, middleware};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};
use workpulse_api::{DailySnapshot, HealthReport, NetworkInfo, PortInfo, StatusAck};

use crate::{IngressError, IngressResult, StatusBackend};

type SharedBackend = Arc<dyn StatusBackend>;

/// HTTP ingress bound to a local address
pub struct HttpIngress {
    listener: TcpListener,
    local_addr: SocketAddr,
    backend: SharedBackend,
}

impl HttpIngress {
    /// Bind the listener
    pub async fn bind(addr: SocketAddr, backend: SharedBackend) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "HTTP ingress listening");

        Ok(Self {
            listener,
            local_addr,
            backend,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, router(self.backend))
            .with_graceful_shutdown(shutdown)
            .await?;

        debug!("HTTP ingress stopped");
        Ok(())
    }
}

/// Build the ingress router
pub fn router(backend: SharedBackend) -> Router {
    Router::new()
        .route("/status", get(submit_status))
        .route("/health", get(health))
        .route("/stats/today", get(today_stats))
        .route("/network", get(network))
        .route("/ports", get(ports))
        .fallback(not_found)
        .layer(middleware::map_response(add_cors_headers))
        .with_state(backend)
}

const STATUS_PARAM: &str = "cursor_status";

/// First `cursor_status` value in the query. Repeated keys are allowed.
fn status_param(pairs: Vec<(String, String)>) -> Option<String> {
    pairs
        .into_iter()
        .find(|(key, _)| key == STATUS_PARAM)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

async fn submit_status(
    State(backend): State<SharedBackend>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> IngressResult<Json<StatusAck>> {
    let pairs = match query {
        Ok(Query(pairs)) => pairs,
        Err(rejection) => {
            debug!(error = %rejection, "Unparseable status query");
            return Err(IngressError::MissingParameter);
        }
    };
    let status = status_param(pairs).ok_or(IngressError::MissingParameter)?;

    debug!(status = %status, "Status received");
    backend.submit_status(status.clone()).await?;

    Ok(Json(StatusAck::new(status)))
}

async fn health(State(backend): State<SharedBackend>) -> IngressResult<Json<HealthReport>> {
    let snapshot = backend.health().await?;
    Ok(Json(HealthReport::ok(snapshot, workpulse_util::now())))
}

async fn today_stats(State(backend): State<SharedBackend>) -> IngressResult<Json<DailySnapshot>> {
    Ok(Json(backend.today_stats().await?))
}

async fn network(State(backend): State<SharedBackend>) -> IngressResult<Json<NetworkInfo>> {
    Ok(Json(backend.network().await?))
}

async fn ports(State(backend): State<SharedBackend>) -> IngressResult<Json<PortInfo>> {
    Ok(Json(backend.ports().await?))
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn add_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Origin, X-Requested-With, Content-Type, Accept"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use workpulse_api::HealthSnapshot;
    use workpulse_util::ElapsedTime;

    #[derive(Default)]
    struct MockBackend {
        received: Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl StatusBackend for MockBackend {
        async fn submit_status(&self, status: String) -> IngressResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(IngressError::Internal("service unavailable".into()));
            }
            self.received.lock().unwrap().push(status);
            Ok(())
        }

        async fn health(&self) -> IngressResult<HealthSnapshot> {
            Ok(HealthSnapshot {
                connected_clients: 2,
                is_working: true,
                work_elapsed_time: ElapsedTime::from_secs(75),
                ledger_healthy: true,
            })
        }

        async fn today_stats(&self) -> IngressResult<DailySnapshot> {
            Ok(DailySnapshot {
                today_count: 3,
                today_duration: ElapsedTime::from_secs(600),
                date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            })
        }

        async fn network(&self) -> IngressResult<NetworkInfo> {
            Ok(NetworkInfo::default())
        }

        async fn ports(&self) -> IngressResult<PortInfo> {
            Ok(PortInfo {
                http_addr: "127.0.0.1:4090".parse().unwrap(),
                push_addr: Some("0.0.0.0:4091".parse().unwrap()),
            })
        }
    }

    async fn spawn_ingress(backend: Arc<MockBackend>) -> String {
        let ingress = HttpIngress::bind("127.0.0.1:0".parse().unwrap(), backend)
            .await
            .unwrap();
        let base = format!("http://{}", ingress.local_addr());
        tokio::spawn(ingress.serve(std::future::pending()));
        base
    }

    #[tokio::test]
    async fn test_submit_status() {
        let backend = Arc::new(MockBackend::default());
        let base = spawn_ingress(backend.clone()).await;

        let response = reqwest::get(format!("{}/status?cursor_status=working%20hard", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "状态更新成功");
        assert_eq!(body["received_status"], "working hard");
        assert_eq!(*backend.received.lock().unwrap(), vec!["working hard"]);
    }

    #[tokio::test]
    async fn test_missing_status() {
        let backend = Arc::new(MockBackend::default());
        let base = spawn_ingress(backend.clone()).await;

        for url in [format!("{}/status", base), format!("{}/status?cursor_status=", base)] {
            let response = reqwest::get(url).await.unwrap();
            assert_eq!(response.status(), 400);
            assert_eq!(
                response.headers()["access-control-allow-methods"],
                "GET, POST, PUT, DELETE"
            );

            let body: serde_json::Value = response.json().await.unwrap();
            assert_eq!(body["error"], "格式错误");
            assert_eq!(body["message"], "缺少cursor_status参数");
        }
        assert!(backend.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_status_takes_first() {
        let backend = Arc::new(MockBackend::default());
        let base = spawn_ingress(backend.clone()).await;

        let response = reqwest::get(format!("{}/status?cursor_status=a&cursor_status=b", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["content-type"], "application/json");

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["received_status"], "a");
        assert_eq!(*backend.received.lock().unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_odd_queries_get_json_errors() {
        let backend = Arc::new(MockBackend::default());
        let base = spawn_ingress(backend.clone()).await;

        for query in ["cursor_status=&cursor_status=b", "other=1", "cursor_status"] {
            let response = reqwest::get(format!("{}/status?{}", base, query)).await.unwrap();
            assert_eq!(response.status(), 400, "query {}", query);
            assert_eq!(response.headers()["content-type"], "application/json");

            let body: serde_json::Value = response.json().await.unwrap();
            assert_eq!(body["error"], "格式错误");
            assert_eq!(body["message"], "缺少cursor_status参数");
        }
        assert!(backend.received.lock().unwrap().is_empty());
    }

    #[test]
    fn test_status_param() {
        let pair = |k: &str, v: &str| (k.to_string(), v.to_string());

        assert_eq!(
            status_param(vec![pair("x", "1"), pair("cursor_status", "idle")]).as_deref(),
            Some("idle")
        );
        assert_eq!(status_param(vec![pair("cursor_status", "")]), None);
        assert_eq!(status_param(vec![]), None);
    }

    #[tokio::test]
    async fn test_internal_error() {
        let backend = Arc::new(MockBackend::default());
        backend.fail.store(true, Ordering::SeqCst);
        let base = spawn_ingress(backend).await;

        let response = reqwest::get(format!("{}/status?cursor_status=working", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 500);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "格式错误");
        assert_eq!(body["message"], "服务器内部错误");
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn_ingress(Arc::new(MockBackend::default())).await;

        let body: serde_json::Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connected_clients"], 2);
        assert_eq!(body["is_working"], true);
        assert_eq!(body["work_elapsed_time"], "01:15");
        assert_eq!(body["ledger_healthy"], true);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_read_only_views() {
        let base = spawn_ingress(Arc::new(MockBackend::default())).await;

        let stats: serde_json::Value = reqwest::get(format!("{}/stats/today", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats["todayCount"], 3);
        assert_eq!(stats["todayDuration"], "10:00");
        assert_eq!(stats["date"], "2025-06-02");

        let network: serde_json::Value = reqwest::get(format!("{}/network", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(network["mac"].is_null());
        assert!(network["ipv4"].is_null());

        let ports: serde_json::Value = reqwest::get(format!("{}/ports", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(ports["http_addr"], "127.0.0.1:4090");
        assert_eq!(ports["push_addr"], "0.0.0.0:4091");
    }

    #[tokio::test]
    async fn test_unknown_route_has_cors() {
        let base = spawn_ingress(Arc::new(MockBackend::default())).await;

        let response = reqwest::get(format!("{}/nope", base)).await.unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(
            response.headers()["access-control-allow-headers"],
            "Origin, X-Requested-With, Content-Type, Accept"
        );
    }
}

//! The service loop

use anyhow::{Context, Result, anyhow};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use workpulse_api::{Envelope, EnvelopePayload, HealthSnapshot, PortInfo};
use workpulse_config::Settings;
use workpulse_core::{CoreEvent, MarkerClassifier, WorkTimer};
use workpulse_http::HttpIngress;
use workpulse_relay::{Broadcaster, PushServer, ServerMessage};
use workpulse_store::Ledger;
use workpulse_util::Clock;

use crate::{ServiceHandle, ServiceRequest};

/// Main service state
pub struct Service {
    timer: WorkTimer,
    clock: Arc<dyn Clock>,
    broadcaster: Arc<Broadcaster>,
    push: Arc<PushServer>,
    ingress: Option<HttpIngress>,
    http_addr: SocketAddr,
    requests: mpsc::UnboundedReceiver<ServiceRequest>,
    tick_interval: Duration,
    shutdown_timeout: Duration,
}

impl Service {
    /// Build the service and bind both listeners
    pub async fn new(settings: Settings, ledger: Arc<dyn Ledger>, clock: Arc<dyn Clock>) -> Result<Self> {
        let broadcaster = Arc::new(Broadcaster::new());

        let push = PushServer::new(settings.service.push_addr, broadcaster.clone());
        push.start()
            .await
            .with_context(|| format!("Failed to bind push channel on {}", settings.service.push_addr))?;

        let (request_tx, requests) = mpsc::unbounded_channel();
        let ingress = HttpIngress::bind(
            settings.service.http_addr,
            Arc::new(ServiceHandle::new(request_tx)),
        )
        .await
        .with_context(|| format!("Failed to bind HTTP ingress on {}", settings.service.http_addr))?;

        let timer = WorkTimer::new(MarkerClassifier::from(&settings.markers), ledger);

        Ok(Self {
            timer,
            clock,
            broadcaster,
            push: Arc::new(push),
            http_addr: ingress.local_addr(),
            ingress: Some(ingress),
            requests,
            tick_interval: settings.service.tick_interval,
            shutdown_timeout: settings.service.shutdown_timeout,
        })
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    pub fn push_addr(&self) -> Option<SocketAddr> {
        self.push.local_addr()
    }

    /// Run until SIGTERM, SIGINT or SIGHUP
    pub async fn run(self) -> Result<()> {
        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;

        let shutdown = async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
                _ = sighup.recv() => info!("Received SIGHUP, shutting down gracefully"),
            }
        };

        self.run_until(shutdown).await
    }

    /// Run until `shutdown` resolves, then tear down within the configured
    /// timeout
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut push_messages = self
            .push
            .take_message_receiver()
            .ok_or_else(|| anyhow!("Push message receiver already taken"))?;
        let ingress = self
            .ingress
            .take()
            .ok_or_else(|| anyhow!("HTTP ingress already running"))?;

        let push_accept = self.push.clone();
        let push_task = tokio::spawn(async move {
            if let Err(e) = push_accept.run().await {
                error!(error = %e, "Push server error");
            }
        });

        let http_stop = CancellationToken::new();
        let http_task = {
            let stop = http_stop.clone();
            tokio::spawn(async move {
                if let Err(e) = ingress.serve(async move { stop.cancelled().await }).await {
                    error!(error = %e, "HTTP ingress error");
                }
            })
        };

        tokio::pin!(shutdown);
        let mut ticker: Option<Interval> = None;

        info!("Service running");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,

                // Work timer tick, only armed while a session is active
                _ = next_tick(&mut ticker) => {
                    if let Some(event) = self.timer.tick(self.clock.now_mono()) {
                        self.handle_core_event(event);
                    }
                }

                Some(msg) = push_messages.recv() => {
                    self.handle_push_message(msg);
                }

                Some(request) = self.requests.recv() => {
                    self.handle_request(request);
                    self.sync_ticker(&mut ticker);
                }
            }
        }

        info!("Shutting down workpulsed");

        // Stop the timer before closing subscribers so nothing is sent after close
        drop(ticker);
        http_stop.cancel();

        // Fail queued requests instead of leaving their callers waiting
        self.requests.close();
        while self.requests.try_recv().is_ok() {}

        let push = self.push.clone();
        let timeout = self.shutdown_timeout;
        let teardown = async move {
            push.shutdown(timeout).await;
            let _ = push_task.await;
            let _ = http_task.await;
        };

        if tokio::time::timeout(timeout, teardown).await.is_err() {
            warn!(timeout = ?timeout, "Shutdown timed out");
        }

        info!("Shutdown complete");
        Ok(())
    }

    fn handle_request(&mut self, request: ServiceRequest) {
        match request {
            ServiceRequest::SubmitStatus { status, reply } => {
                let events = self
                    .timer
                    .on_status(&status, self.clock.now(), self.clock.now_mono());
                for event in events {
                    self.handle_core_event(event);
                }

                self.broadcast(EnvelopePayload::StatusUpdate { status });
                let _ = reply.send(());
            }

            ServiceRequest::Health { reply } => {
                let _ = reply.send(HealthSnapshot {
                    connected_clients: self.broadcaster.len(),
                    is_working: self.timer.is_working(),
                    work_elapsed_time: self.timer.elapsed(),
                    ledger_healthy: self.timer.ledger_healthy(),
                });
            }

            ServiceRequest::TodayStats { reply } => {
                let _ = reply.send(self.timer.today_stats(self.clock.now().date_naive()));
            }

            ServiceRequest::Ports { reply } => {
                let _ = reply.send(PortInfo {
                    http_addr: self.http_addr,
                    push_addr: self.push_addr(),
                });
            }
        }
    }

    fn handle_core_event(&self, event: CoreEvent) {
        match event {
            CoreEvent::TimerUpdate(view) => {
                self.broadcast(EnvelopePayload::WorkTimerUpdate(view));
            }
            CoreEvent::StatsUpdated(snapshot) => {
                self.broadcast(EnvelopePayload::WorkStatsUpdate(snapshot));
            }
            CoreEvent::SessionStarted { started_at } => {
                debug!(started_at = %started_at, "Session started");
            }
            CoreEvent::SessionAbandoned { elapsed } => {
                debug!(elapsed = %elapsed, "Session abandoned");
            }
        }
    }

    fn handle_push_message(&self, msg: ServerMessage) {
        match msg {
            ServerMessage::SubscriberConnected { subscriber } => {
                let now = self.clock.now();
                let mut snapshots = vec![Envelope::new(
                    EnvelopePayload::WorkStatsUpdate(self.timer.today_stats(now.date_naive())),
                    now,
                )];
                if let Some(view) = self.timer.timer_snapshot() {
                    snapshots.push(Envelope::new(EnvelopePayload::WorkTimerUpdate(view), now));
                }

                self.broadcaster.register(subscriber, &snapshots);
            }
            ServerMessage::SubscriberDisconnected { client_id } => {
                // The connection may have closed before its registration was
                // handled here
                self.broadcaster.unregister(&client_id);
                debug!(client_id = %client_id, "Subscriber disconnected");
            }
        }
    }

    fn broadcast(&self, payload: EnvelopePayload) {
        self.broadcaster
            .broadcast(&Envelope::new(payload, self.clock.now()));
    }

    /// Arm the tick on entering Active, disarm it on leaving
    fn sync_ticker(&self, ticker: &mut Option<Interval>) {
        match (self.timer.is_working(), ticker.is_some()) {
            (true, false) => {
                let period = self.tick_interval;
                let mut interval = interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *ticker = Some(interval);
            }
            (false, true) => *ticker = None,
            _ => {}
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

//! Subscriber registry and envelope fan-out

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};
use workpulse_api::{Envelope, EnvelopePayload};
use workpulse_util::ClientId;

use crate::Subscriber;

/// Outcome of a single broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub success_count: usize,
    pub fail_count: usize,
}

/// The set of live subscribers.
///
/// A subscriber is dropped the moment a delivery to it fails or it is seen
/// closed, so the set never needs a separate sweep.
#[derive(Default)]
pub struct Broadcaster {
    subscribers: Mutex<HashMap<ClientId, Arc<dyn Subscriber>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ClientId, Arc<dyn Subscriber>>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a subscriber.
    ///
    /// It is greeted with `connection_established`, then sent `snapshots` in
    /// order. Returns false if the subscriber was already gone.
    pub fn register(&self, subscriber: Arc<dyn Subscriber>, snapshots: &[Envelope]) -> bool {
        let client_id = subscriber.id();
        let greeting = Envelope::now(EnvelopePayload::connection_established());

        let delivered = std::iter::once(&greeting)
            .chain(snapshots)
            .all(|envelope| subscriber.send_envelope(envelope).is_ok());

        if !delivered {
            debug!(client_id = %client_id, "Subscriber closed before registration");
            return false;
        }

        let count = {
            let mut subscribers = self.lock();
            subscribers.insert(client_id, subscriber);
            subscribers.len()
        };

        info!(client_id = %client_id, subscribers = count, "Subscriber registered");
        true
    }

    /// Deliver an envelope to every live subscriber
    pub fn broadcast(&self, envelope: &Envelope) -> BroadcastReport {
        let text = match serde_json::to_string(envelope) {
            Ok(text) => text,
            Err(e) => {
                error!(kind = envelope.kind(), error = %e, "Failed to serialize envelope");
                return BroadcastReport::default();
            }
        };

        let members: Vec<Arc<dyn Subscriber>> = self.lock().values().cloned().collect();

        let mut report = BroadcastReport::default();
        let mut failed = Vec::new();
        for subscriber in members {
            if subscriber.is_open() && subscriber.send(&text).is_ok() {
                report.success_count += 1;
            } else {
                report.fail_count += 1;
                failed.push(subscriber.id());
            }
        }

        if !failed.is_empty() {
            let mut subscribers = self.lock();
            for client_id in &failed {
                subscribers.remove(client_id);
                debug!(client_id = %client_id, "Removed failed subscriber");
            }
        }

        debug!(
            kind = envelope.kind(),
            success = report.success_count,
            failed = report.fail_count,
            "Broadcast"
        );

        report
    }

    /// Remove a subscriber. Returns whether it was present.
    pub fn unregister(&self, client_id: &ClientId) -> bool {
        let removed = self.lock().remove(client_id).is_some();
        if removed {
            info!(client_id = %client_id, "Subscriber unregistered");
        }
        removed
    }

    /// Close and remove every subscriber
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = self.lock().drain().map(|(_, s)| s).collect();
        for subscriber in &drained {
            subscriber.close();
        }
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

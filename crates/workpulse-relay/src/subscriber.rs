//! Subscriber handles

use tokio::sync::mpsc;
use workpulse_api::Envelope;
use workpulse_util::ClientId;

use crate::{RelayError, RelayResult};

/// A live push-channel connection
pub trait Subscriber: Send + Sync {
    fn id(&self) -> ClientId;

    /// Whether the connection can still accept frames
    fn is_open(&self) -> bool;

    /// Queue a serialized envelope for delivery
    fn send(&self, text: &str) -> RelayResult<()>;

    /// Ask the connection to close
    fn close(&self);

    fn send_envelope(&self, envelope: &Envelope) -> RelayResult<()> {
        let text = serde_json::to_string(envelope)?;
        self.send(&text)
    }
}

/// Frame queued for a connection's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Close,
}

/// Subscriber backed by an unbounded channel into a writer task
#[derive(Debug)]
pub struct ChannelSubscriber {
    id: ClientId,
    tx: mpsc::UnboundedSender<OutboundFrame>,
}

impl ChannelSubscriber {
    pub fn new(id: ClientId) -> (Self, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }
}

impl Subscriber for ChannelSubscriber {
    fn id(&self) -> ClientId {
        self.id
    }

    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, text: &str) -> RelayResult<()> {
        self.tx
            .send(OutboundFrame::Text(text.to_string()))
            .map_err(|_| RelayError::ConnectionClosed)
    }

    fn close(&self) {
        let _ = self.tx.send(OutboundFrame::Close);
    }
}

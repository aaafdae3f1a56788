//! WebSocket push server

use futures::future::join_all;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use workpulse_api::{ClientMessage, Envelope, EnvelopePayload};
use workpulse_util::ClientId;

use crate::{Broadcaster, ChannelSubscriber, OutboundFrame, RelayError, RelayResult, Subscriber};

/// Message from the push server to the service
pub enum ServerMessage {
    /// Handshake completed; the service decides what to send first
    SubscriberConnected { subscriber: Arc<dyn Subscriber> },
    SubscriberDisconnected { client_id: ClientId },
}

/// Push server
pub struct PushServer {
    addr: SocketAddr,
    listener: Mutex<Option<TcpListener>>,
    local_addr: Mutex<Option<SocketAddr>>,
    broadcaster: Arc<Broadcaster>,
    message_tx: mpsc::UnboundedSender<ServerMessage>,
    message_rx: Mutex<Option<mpsc::UnboundedReceiver<ServerMessage>>>,
    cancel: CancellationToken,
    connections: Mutex<Vec<JoinHandle<()>>>,
}

impl PushServer {
    pub fn new(addr: SocketAddr, broadcaster: Arc<Broadcaster>) -> Self {
        let (message_tx, message_rx) = mpsc::unbounded_channel();

        Self {
            addr,
            listener: Mutex::new(None),
            local_addr: Mutex::new(None),
            broadcaster,
            message_tx,
            message_rx: Mutex::new(Some(message_rx)),
            cancel: CancellationToken::new(),
            connections: Mutex::new(Vec::new()),
        }
    }

    /// Bind the listener. Returns the bound address.
    pub async fn start(&self) -> RelayResult<SocketAddr> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "Push server listening");

        *lock(&self.listener) = Some(listener);
        *lock(&self.local_addr) = Some(local_addr);
        Ok(local_addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        *lock(&self.local_addr)
    }

    /// Get receiver for server messages
    pub fn take_message_receiver(&self) -> Option<mpsc::UnboundedReceiver<ServerMessage>> {
        lock(&self.message_rx).take()
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// Accept connections until shutdown
    pub async fn run(&self) -> RelayResult<()> {
        let listener = lock(&self.listener)
            .take()
            .ok_or_else(|| RelayError::ServerError("Server not started".into()))?;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Push server stopped accepting");
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let handle = tokio::spawn(serve_connection(
                                stream,
                                peer,
                                self.broadcaster.clone(),
                                self.message_tx.clone(),
                                self.cancel.clone(),
                            ));

                            let mut connections = lock(&self.connections);
                            connections.retain(|h| !h.is_finished());
                            connections.push(handle);
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Stop accepting, close every subscriber, and wait (bounded) for
    /// connection teardown
    pub async fn shutdown(&self, timeout: Duration) {
        self.cancel.cancel();
        let closed = self.broadcaster.close_all();

        let handles: Vec<JoinHandle<()>> = lock(&self.connections).drain(..).collect();
        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();

        info!(subscribers = closed, connections = handles.len(), "Closing push channel");

        if tokio::time::timeout(timeout, join_all(handles)).await.is_err() {
            warn!(timeout = ?timeout, "Push channel teardown timed out, aborting connections");
            for abort in aborts {
                abort.abort();
            }
        }
    }
}

/// Aborts the writer task if its connection task is dropped or aborted
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    broadcaster: Arc<Broadcaster>,
    message_tx: mpsc::UnboundedSender<ServerMessage>,
    cancel: CancellationToken,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(peer = %peer, error = %e, "WebSocket handshake failed");
            return;
        }
    };

    let client_id = ClientId::new();
    let (subscriber, mut outbound_rx) = ChannelSubscriber::new(client_id);
    let subscriber = Arc::new(subscriber);
    let (mut sink, mut inbound) = ws.split();

    info!(client_id = %client_id, peer = %peer, "Subscriber connected");

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let message = match frame {
                OutboundFrame::Text(text) => Message::Text(text),
                OutboundFrame::Close => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            };
            if let Err(e) = sink.send(message).await {
                debug!(client_id = %client_id, error = %e, "Write error");
                break;
            }
        }
    });
    let _writer_guard = AbortOnDrop(writer.abort_handle());

    let _ = message_tx.send(ServerMessage::SubscriberConnected {
        subscriber: subscriber.clone(),
    });

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            frame = inbound.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => handle_inbound(subscriber.as_ref(), &text),
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(client_id = %client_id, "Subscriber closed connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(client_id = %client_id, error = %e, "Read error");
                        break;
                    }
                }
            }
        }
    }

    subscriber.close();
    broadcaster.unregister(&client_id);
    let _ = message_tx.send(ServerMessage::SubscriberDisconnected { client_id });

    drop(subscriber);
    let _ = writer.await;
}

fn parse_inbound(text: &str) -> RelayResult<ClientMessage> {
    ClientMessage::parse(text).map_err(|e| RelayError::MalformedMessage(e.to_string()))
}

fn handle_inbound(subscriber: &dyn Subscriber, text: &str) {
    match parse_inbound(text) {
        Ok(ClientMessage::Ping) => {
            if let Err(e) = subscriber.send_envelope(&Envelope::now(EnvelopePayload::Pong)) {
                debug!(client_id = %subscriber.id(), error = %e, "Failed to send pong");
            }
        }
        Ok(ClientMessage::Unknown) => {
            debug!(client_id = %subscriber.id(), message = text, "Ignoring unhandled message");
        }
        Err(e) => {
            warn!(client_id = %subscriber.id(), error = %e, "Malformed inbound message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn start_server() -> (Arc<PushServer>, mpsc::UnboundedReceiver<ServerMessage>, SocketAddr) {
        let server = PushServer::new("127.0.0.1:0".parse().unwrap(), Arc::new(Broadcaster::new()));
        let addr = server.start().await.unwrap();
        let messages = server.take_message_receiver().unwrap();
        let server = Arc::new(server);

        let runner = server.clone();
        tokio::spawn(async move { runner.run().await });

        (server, messages, addr)
    }

    async fn connect(
        server: &PushServer,
        messages: &mut mpsc::UnboundedReceiver<ServerMessage>,
        addr: SocketAddr,
    ) -> Client {
        let (client, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
        let Some(ServerMessage::SubscriberConnected { subscriber }) = messages.recv().await else {
            panic!("expected connection message");
        };
        server.broadcaster().register(subscriber, &[]);
        client
    }

    async fn next_json(client: &mut Client) -> serde_json::Value {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("unexpected frame: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_greeting_and_broadcast() {
        let (server, mut messages, addr) = start_server().await;
        let mut client = connect(&server, &mut messages, addr).await;

        let greeting = next_json(&mut client).await;
        assert_eq!(greeting["type"], "connection_established");
        assert_eq!(greeting["payload"]["message"], "连接成功");

        let report = server.broadcaster().broadcast(&Envelope::now(EnvelopePayload::StatusUpdate {
            status: "working".into(),
        }));
        assert_eq!(report.success_count, 1);

        let update = next_json(&mut client).await;
        assert_eq!(update["type"], "status_update");
        assert_eq!(update["payload"]["status"], "working");
    }

    #[tokio::test]
    async fn test_ping_pong_survives_malformed_input() {
        let (server, mut messages, addr) = start_server().await;
        let mut client = connect(&server, &mut messages, addr).await;
        next_json(&mut client).await;

        client.send(Message::Text("not json".into())).await.unwrap();
        client.send(Message::Text(r#"{"type":"hello"}"#.into())).await.unwrap();
        client.send(Message::Text(r#"{"type":"ping"}"#.into())).await.unwrap();

        let pong = next_json(&mut client).await;
        assert_eq!(pong["type"], "pong");
        assert!(pong.get("timestamp").is_some());
    }

    #[tokio::test]
    async fn test_disconnect_unregisters() {
        let (server, mut messages, addr) = start_server().await;
        let mut client = connect(&server, &mut messages, addr).await;
        next_json(&mut client).await;
        assert_eq!(server.broadcaster().len(), 1);

        client.close(None).await.unwrap();

        let Some(ServerMessage::SubscriberDisconnected { .. }) = messages.recv().await else {
            panic!("expected disconnect message");
        };
        assert!(server.broadcaster().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_closes_subscribers() {
        let (server, mut messages, addr) = start_server().await;
        let mut client = connect(&server, &mut messages, addr).await;
        next_json(&mut client).await;

        server.shutdown(Duration::from_secs(5)).await;
        assert!(server.broadcaster().is_empty());

        loop {
            match client.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    }

    #[tokio::test]
    async fn test_shutdown_bounded_when_client_stops_reading() {
        let (server, mut messages, addr) = start_server().await;
        // Never read from this client, so the server's writes back up
        let _client = connect(&server, &mut messages, addr).await;

        let bulk = Envelope::now(EnvelopePayload::StatusUpdate {
            status: "x".repeat(1 << 20),
        });
        for _ in 0..32 {
            assert_eq!(server.broadcaster().broadcast(&bulk).success_count, 1);
        }

        let timeout = Duration::from_millis(500);
        let started = std::time::Instant::now();
        server.shutdown(timeout).await;
        let elapsed = started.elapsed();

        assert!(elapsed >= timeout, "writer finished early: {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(3), "shutdown overran: {:?}", elapsed);
        assert!(server.broadcaster().is_empty());
    }
}

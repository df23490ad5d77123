//! Shared helpers for the integration suites: an in-memory connector
//! that stands in for the backend, plus event-channel utilities.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc};

use hiresmart_realtime::{
    ConnectionState, Notification, SocketConnector, SocketEvent, SocketHandle, TransportError,
    TransportEvent, WireFrame,
};

/// Generous ceiling for awaited events; paused-clock tests skip straight
/// through it.
pub const WAIT: Duration = Duration::from_secs(60);

/// Initialize logging for debugging; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Scripted outcome for one `connect` call.
pub enum ConnectOutcome {
    /// Hand the client a live in-memory socket.
    Accept,
    /// Fail the handshake.
    Refuse,
}

/// The backend half of an accepted in-memory connection.
pub struct ServerEnd {
    /// URL the client resolved for this attempt.
    pub url: String,
    /// Frames the client transmitted.
    pub outbound: mpsc::Receiver<WireFrame>,
    /// Injects socket events toward the client.
    pub events: mpsc::Sender<SocketEvent>,
}

impl ServerEnd {
    pub async fn send_json(&self, value: Value) {
        self.events
            .send(SocketEvent::Frame(WireFrame::Text(value.to_string())))
            .await
            .expect("client side gone");
    }

    pub async fn send_text(&self, text: &str) {
        self.events
            .send(SocketEvent::Frame(WireFrame::Text(text.to_owned())))
            .await
            .expect("client side gone");
    }

    pub async fn close(&self, code: u16) {
        self.events
            .send(SocketEvent::Closed {
                code,
                reason: String::new(),
            })
            .await
            .expect("client side gone");
    }

    pub async fn fault(&self, error: &str) {
        self.events
            .send(SocketEvent::Error(error.to_owned()))
            .await
            .expect("client side gone");
    }

    /// Next transmitted text frame, parsed as JSON.
    pub async fn expect_json(&mut self) -> Value {
        match tokio::time::timeout(WAIT, self.outbound.recv())
            .await
            .expect("timed out waiting for outbound frame")
        {
            Some(WireFrame::Text(text)) => {
                serde_json::from_str(&text).expect("outbound frame is not JSON")
            }
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    /// Next transmitted frame, expected to be a close.
    pub async fn expect_close(&mut self) -> u16 {
        match tokio::time::timeout(WAIT, self.outbound.recv())
            .await
            .expect("timed out waiting for close frame")
        {
            Some(WireFrame::Close { code, .. }) => code,
            other => panic!("expected close frame, got {other:?}"),
        }
    }
}

/// In-memory [`SocketConnector`] following a scripted plan; connects
/// beyond the plan are accepted.
pub struct FakeConnector {
    plan: Mutex<VecDeque<ConnectOutcome>>,
    accepts_tx: mpsc::UnboundedSender<ServerEnd>,
    calls: AtomicUsize,
}

impl FakeConnector {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ServerEnd>) {
        let (accepts_tx, accepts_rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                plan: Mutex::new(VecDeque::new()),
                accepts_tx,
                calls: AtomicUsize::new(0),
            }),
            accepts_rx,
        )
    }

    /// Queue `n` refused handshakes ahead of the default accepts.
    pub fn refuse_next(&self, n: usize) {
        let mut plan = self.plan.lock();
        for _ in 0..n {
            plan.push_back(ConnectOutcome::Refuse);
        }
    }

    /// Total `connect` calls observed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SocketConnector for FakeConnector {
    async fn connect(&self, url: &str) -> Result<SocketHandle, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .plan
            .lock()
            .pop_front()
            .unwrap_or(ConnectOutcome::Accept);
        match outcome {
            ConnectOutcome::Accept => {
                let (handle, outbound, events) = SocketHandle::channel();
                let _ = self.accepts_tx.send(ServerEnd {
                    url: url.to_owned(),
                    outbound,
                    events,
                });
                Ok(handle)
            }
            ConnectOutcome::Refuse => Err(TransportError::ConnectionFailed(
                "connection refused".to_owned(),
            )),
        }
    }
}

/// Await the next accepted connection.
pub async fn next_accept(accepts: &mut mpsc::UnboundedReceiver<ServerEnd>) -> ServerEnd {
    tokio::time::timeout(WAIT, accepts.recv())
        .await
        .expect("timed out waiting for a connection")
        .expect("connector gone")
}

/// Await the next notification event.
pub async fn next_notification(events: &mut broadcast::Receiver<TransportEvent>) -> Notification {
    loop {
        let event = tokio::time::timeout(WAIT, events.recv())
            .await
            .expect("timed out waiting for a notification")
            .expect("event channel closed");
        if let TransportEvent::Notification(notification) = event {
            return notification;
        }
    }
}

/// Await a specific state transition, skipping unrelated events.
pub async fn wait_for_state(
    events: &mut broadcast::Receiver<TransportEvent>,
    state: ConnectionState,
) {
    loop {
        let event = tokio::time::timeout(WAIT, events.recv())
            .await
            .expect("timed out waiting for a state change")
            .expect("event channel closed");
        if let TransportEvent::StateChanged(seen) = event {
            if seen == state {
                return;
            }
        }
    }
}

/// Drain everything currently queued on the event channel.
pub fn drain_events(events: &mut broadcast::Receiver<TransportEvent>) -> Vec<TransportEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

/// Build a server frame of the given kind with the standard envelope.
pub fn server_frame(kind: &str, extra: Value) -> Value {
    let mut frame = json!({
        "type": kind,
        "session_id": "abc123",
        "timestamp": 1_700_000_000_000_u64,
    });
    if let (Some(target), Some(source)) = (frame.as_object_mut(), extra.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    frame
}

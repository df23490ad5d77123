//! Session transport client.
//!
//! [`SessionClient`] owns one socket per active interview or coding
//! session and exposes a publish/subscribe surface to the rest of the
//! application: current connection state, the message log, and a
//! broadcast channel of state changes, messages, and notifications.
//!
//! # Architecture
//!
//! All state transitions happen on a single background event loop, driven
//! by four sources: handle commands, socket lifecycle events, the
//! reconnect timer, and the auth watch channel. One event is handled at a
//! time, in arrival order; no transition races another. Handle methods
//! return immediately and absorb failures; nothing here raises an error
//! to the caller. Observability is entirely through state transitions and
//! notifications.
//!
//! # Reconnection
//!
//! An unexpected close (code other than 1000) schedules a retry with
//! exponential backoff, capped at 30 seconds and bounded to 5 attempts
//! per session lifetime; a successful open resets the budget. Explicit
//! `disconnect` cancels any pending retry. Transport faults surface as
//! the `Error` state plus a notification and never retry by themselves;
//! only the close event drives recovery.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch};

use crate::auth::AuthSource;
use crate::config::TransportConfig;
use crate::events::{ConnectionState, Notification, NotifyLevel, TransportEvent};
use crate::messages::{auth_frame, InboundMessage, MessageLog, MessagePayload};
use crate::reconnect::ReconnectPolicy;
use crate::session::{SessionId, SessionKind, SessionTarget};
use crate::socket::{
    SocketConnector, SocketEvent, SocketHandle, TungsteniteConnector, WireFrame, CLOSE_ABNORMAL,
    CLOSE_NORMAL, CLOSE_REASON,
};
use crate::timer::ReconnectTimer;

/// Depth of the consumer broadcast channel.
const EVENT_BUFFER: usize = 256;

/// Correlation id for one connection attempt, used in log output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptId(String);

impl AttemptId {
    /// Generate a new random attempt id.
    #[must_use]
    pub fn new() -> Self {
        use rand::Rng;
        let bytes: [u8; 8] = rand::thread_rng().gen();
        Self(format!("conn_{}", hex::encode(bytes)))
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Counters for the current client, mirroring the per-connection
/// metadata the backend keeps on its side.
#[derive(Clone, Debug, Default)]
pub struct ConnectionStats {
    /// When the current connection opened, if one is open.
    pub connected_at: Option<Instant>,
    /// Parsed frames received across the client lifetime.
    pub frames_received: u64,
    /// Frames transmitted.
    pub frames_sent: u64,
    /// Sends dropped because the socket was not open.
    pub sends_dropped: u64,
    /// Reconnect attempts scheduled.
    pub reconnects: u64,
    /// Last send or receive activity.
    pub last_activity: Option<Instant>,
}

#[derive(Debug)]
enum Command {
    Connect(SessionTarget),
    Disconnect,
    SendJson(Value),
    SendBinary(Vec<u8>),
    ClearMessages,
}

struct Shared {
    state: RwLock<ConnectionState>,
    log: RwLock<MessageLog>,
    stats: RwLock<ConnectionStats>,
}

/// Client-side transport manager for one real-time session channel.
///
/// Dropping the client stops the event loop, cancels any pending
/// reconnect, and closes a live socket with the normal-closure code.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use hiresmart_realtime::{
///     SessionClient, SessionKind, TokenStore, TransportConfig, TransportEvent,
/// };
///
/// let auth = Arc::new(TokenStore::with_token(bearer_token));
/// let client = SessionClient::new(TransportConfig::from_env(), auth);
/// let mut events = client.subscribe();
///
/// client.connect("abc123", SessionKind::Interview);
/// while let Ok(event) = events.recv().await {
///     match event {
///         TransportEvent::Message(msg) => render(msg),
///         TransportEvent::StateChanged(state) => show_status(state),
///         TransportEvent::Notification(note) => toast(note),
///     }
/// }
/// ```
pub struct SessionClient {
    command_tx: mpsc::UnboundedSender<Command>,
    shared: Arc<Shared>,
    events_tx: broadcast::Sender<TransportEvent>,
}

impl SessionClient {
    /// Create a client with the production WebSocket connector.
    #[must_use]
    pub fn new(config: TransportConfig, auth: Arc<dyn AuthSource>) -> Self {
        Self::with_connector(config, auth, Arc::new(TungsteniteConnector))
    }

    /// Create a client with a custom connector.
    ///
    /// Used by tests to drive the lifecycle deterministically, and by
    /// embedders with their own socket stack.
    #[must_use]
    pub fn with_connector(
        config: TransportConfig,
        auth: Arc<dyn AuthSource>,
        connector: Arc<dyn SocketConnector>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
        let shared = Arc::new(Shared {
            state: RwLock::new(ConnectionState::Disconnected),
            log: RwLock::new(MessageLog::new(config.log_capacity)),
            stats: RwLock::new(ConnectionStats::default()),
        });

        let auth_rx = auth.watch_authenticated();
        let reconnect = ReconnectPolicy::new(config.reconnect.clone());
        let worker = Worker {
            config,
            auth,
            connector,
            shared: Arc::clone(&shared),
            events_tx: events_tx.clone(),
            command_rx,
            auth_rx,
            auth_closed: false,
            socket: None,
            target: None,
            reconnect,
            timer: ReconnectTimer::new(),
        };
        tokio::spawn(worker.run());

        Self {
            command_tx,
            shared,
            events_tx,
        }
    }

    /// Open the channel for `session_id`.
    ///
    /// Best-effort: without an authenticated, non-empty token the call is
    /// a no-op that logs an error and raises a notification. Calling
    /// while already connected is a no-op.
    pub fn connect(&self, session_id: impl Into<SessionId>, kind: SessionKind) {
        self.send_command(Command::Connect(SessionTarget::new(session_id, kind)));
    }

    /// Close the channel and cancel any pending reconnect.
    ///
    /// Idempotent: safe to call when already disconnected.
    pub fn disconnect(&self) {
        self.send_command(Command::Disconnect);
    }

    /// Send a JSON-serializable payload over the channel.
    ///
    /// Transmitted immediately when the socket is open. When it is not,
    /// the payload is dropped with a warning log and an error
    /// notification; nothing is queued and nothing is raised.
    pub fn send_message<T: Serialize>(&self, payload: &T) {
        match serde_json::to_value(payload) {
            Ok(value) => self.send_command(Command::SendJson(value)),
            Err(e) => {
                tracing::error!(error = %e, "outbound payload is not serializable");
                self.notify(NotifyLevel::Error, "message could not be serialized");
            }
        }
    }

    /// Send raw binary data (e.g. audio/video chunks) verbatim.
    ///
    /// Same open-socket precondition and drop semantics as
    /// [`send_message`](Self::send_message).
    pub fn send_binary(&self, data: Vec<u8>) {
        self.send_command(Command::SendBinary(data));
    }

    /// Empty the message log and clear the last-message pointer.
    ///
    /// Purely local; no network effect.
    pub fn clear_messages(&self) {
        self.send_command(Command::ClearMessages);
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.read()
    }

    /// Whether the channel is usable for sending.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// The most recently received message.
    #[must_use]
    pub fn last_message(&self) -> Option<InboundMessage> {
        self.shared.log.read().last().cloned()
    }

    /// Snapshot of the retained message history, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<InboundMessage> {
        self.shared.log.read().snapshot()
    }

    /// Connection counters.
    #[must_use]
    pub fn stats(&self) -> ConnectionStats {
        self.shared.stats.read().clone()
    }

    /// Subscribe to state changes, messages, and notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events_tx.subscribe()
    }

    fn send_command(&self, command: Command) {
        if self.command_tx.send(command).is_err() {
            tracing::error!("transport worker is gone; command dropped");
        }
    }

    fn notify(&self, level: NotifyLevel, message: impl Into<String>) {
        let _ = self
            .events_tx
            .send(TransportEvent::Notification(Notification::new(
                level, message,
            )));
    }
}

struct Worker {
    config: TransportConfig,
    auth: Arc<dyn AuthSource>,
    connector: Arc<dyn SocketConnector>,
    shared: Arc<Shared>,
    events_tx: broadcast::Sender<TransportEvent>,
    command_rx: mpsc::UnboundedReceiver<Command>,
    auth_rx: watch::Receiver<bool>,
    auth_closed: bool,
    socket: Option<SocketHandle>,
    target: Option<SessionTarget>,
    reconnect: ReconnectPolicy,
    timer: ReconnectTimer,
}

impl Worker {
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                event = next_socket_event(&mut self.socket) => match event {
                    Some(event) => self.handle_socket_event(event),
                    None => self.handle_closed(CLOSE_ABNORMAL, String::new()),
                },
                target = self.timer.fired() => {
                    self.handle_connect(target).await;
                }
                changed = self.auth_rx.changed(), if !self.auth_closed => {
                    self.handle_auth_change(changed.is_ok());
                }
            }
        }
        self.shutdown();
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect(target) => self.handle_connect(target).await,
            Command::Disconnect => self.handle_disconnect(),
            Command::SendJson(value) => self.handle_send(WireFrame::Text(value.to_string())),
            Command::SendBinary(data) => self.handle_send(WireFrame::Binary(data)),
            Command::ClearMessages => {
                self.shared.log.write().clear();
                tracing::debug!("message log cleared");
            }
        }
    }

    async fn handle_connect(&mut self, target: SessionTarget) {
        if self.socket.is_some() {
            tracing::debug!(session_id = %target.session_id, "already connected, ignoring connect");
            return;
        }
        let token = match self.auth.bearer_token() {
            Some(token) if !token.is_empty() => token,
            _ => {
                tracing::error!(
                    session_id = %target.session_id,
                    "connect requested without authentication"
                );
                self.notify(NotifyLevel::Error, "sign in before starting a session");
                return;
            }
        };

        // A manual connect supersedes any scheduled retry.
        self.timer.cancel();
        self.set_state(ConnectionState::Connecting);

        let attempt_id = AttemptId::new();
        let url = self.config.endpoint_url(&target);
        tracing::info!(
            %attempt_id,
            session_id = %target.session_id,
            kind = ?target.kind,
            %url,
            "opening session channel"
        );
        self.target = Some(target.clone());

        match self.connector.connect(&url).await {
            Ok(handle) => {
                self.socket = Some(handle);
                self.reconnect.reset();
                {
                    let mut stats = self.shared.stats.write();
                    stats.connected_at = Some(Instant::now());
                    stats.last_activity = Some(Instant::now());
                }
                self.set_state(ConnectionState::Connected);
                // The auth frame is the only message generated here.
                self.handle_send(WireFrame::Text(auth_frame(&token).to_string()));
                tracing::info!(%attempt_id, "session channel open");
            }
            Err(e) => {
                tracing::error!(%attempt_id, error = %e, "failed to open session channel");
                self.set_state(ConnectionState::Error);
                self.notify(NotifyLevel::Error, format!("connection error: {e}"));
                // A failed open then follows the unexpected-close path,
                // which is the only driver of retry scheduling.
                self.handle_closed(CLOSE_ABNORMAL, String::new());
            }
        }
    }

    fn handle_disconnect(&mut self) {
        self.timer.cancel();
        self.reconnect.reset();
        self.target = None;
        if let Some(socket) = self.socket.take() {
            let _ = socket.send(WireFrame::Close {
                code: CLOSE_NORMAL,
                reason: CLOSE_REASON.to_owned(),
            });
            self.shared.stats.write().connected_at = None;
            tracing::info!("session channel closed by client");
        }
        self.set_state(ConnectionState::Disconnected);
    }

    fn handle_send(&mut self, frame: WireFrame) {
        let Some(socket) = &self.socket else {
            self.shared.stats.write().sends_dropped += 1;
            tracing::warn!("attempted to send while the channel is not open");
            self.notify(NotifyLevel::Error, "not connected: message was not sent");
            return;
        };
        match socket.send(frame) {
            Ok(()) => {
                let mut stats = self.shared.stats.write();
                stats.frames_sent += 1;
                stats.last_activity = Some(Instant::now());
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to hand frame to socket");
                self.notify(NotifyLevel::Error, "not connected: message was not sent");
            }
        }
    }

    fn handle_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Frame(WireFrame::Text(text)) => self.handle_text_frame(&text),
            SocketEvent::Frame(WireFrame::Binary(data)) => {
                tracing::debug!(len = data.len(), "ignoring inbound binary frame");
            }
            SocketEvent::Frame(WireFrame::Close { code, reason })
            | SocketEvent::Closed { code, reason } => self.handle_closed(code, reason),
            SocketEvent::Error(error) => {
                tracing::error!(%error, "transport fault");
                self.set_state(ConnectionState::Error);
                self.notify(NotifyLevel::Error, format!("connection error: {error}"));
                // Recovery is driven by the close event that follows.
            }
        }
    }

    fn handle_text_frame(&mut self, text: &str) {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "dropping unparseable frame");
                return;
            }
        };
        {
            let mut stats = self.shared.stats.write();
            stats.frames_received += 1;
            stats.last_activity = Some(Instant::now());
        }
        self.shared.log.write().push(message.clone());
        self.dispatch(&message);
        let _ = self.events_tx.send(TransportEvent::Message(message));
    }

    fn dispatch(&self, message: &InboundMessage) {
        match &message.payload {
            MessagePayload::ConnectionEstablished { message: text } => {
                let text = text.clone().unwrap_or_else(|| "connected".to_owned());
                self.notify(NotifyLevel::Success, text);
            }
            MessagePayload::Error { message: text } => {
                let text = text
                    .clone()
                    .unwrap_or_else(|| "the server reported an error".to_owned());
                self.notify(NotifyLevel::Error, text);
            }
            MessagePayload::RealTimeFeedback { .. }
            | MessagePayload::CodingExecutionResult { .. }
            | MessagePayload::InterviewQuestion { .. } => {
                tracing::debug!(kind = message.kind(), "forwarding session message");
            }
            MessagePayload::Unknown { kind, .. } => {
                tracing::warn!(%kind, "unknown message type");
            }
        }
    }

    fn handle_closed(&mut self, code: u16, reason: String) {
        self.socket = None;
        self.shared.stats.write().connected_at = None;
        self.set_state(ConnectionState::Disconnected);

        if code == CLOSE_NORMAL {
            tracing::info!("session channel closed normally");
            return;
        }
        tracing::warn!(code, reason = %reason, "session channel closed unexpectedly");

        let Some(target) = self.target.clone() else {
            return;
        };
        match self.reconnect.next_delay() {
            Some(delay) => {
                self.shared.stats.write().reconnects += 1;
                tracing::info!(
                    attempt = self.reconnect.attempts(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "scheduling reconnect"
                );
                self.timer.schedule(delay, target);
            }
            None => {
                tracing::error!(
                    attempts = self.reconnect.attempts(),
                    "reconnect attempts exhausted"
                );
                self.notify(
                    NotifyLevel::Error,
                    "unable to reconnect; reload the page to start a new session",
                );
            }
        }
    }

    fn handle_auth_change(&mut self, ok: bool) {
        if !ok {
            // Auth source dropped; stop watching but keep serving.
            self.auth_closed = true;
            return;
        }
        let authenticated = *self.auth_rx.borrow_and_update();
        let engaged =
            self.socket.is_some() || self.timer.is_scheduled() || self.target.is_some();
        if !authenticated && engaged {
            tracing::info!("authentication lost, disconnecting");
            self.handle_disconnect();
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let mut current = self.shared.state.write();
        if *current != state {
            tracing::debug!(from = ?*current, to = ?state, "connection state changed");
            *current = state;
            drop(current);
            let _ = self.events_tx.send(TransportEvent::StateChanged(state));
        }
    }

    fn notify(&self, level: NotifyLevel, message: impl Into<String>) {
        let notification = Notification::new(level, message);
        tracing::debug!(level = ?notification.level, message = %notification.message, "notification");
        let _ = self
            .events_tx
            .send(TransportEvent::Notification(notification));
    }

    fn shutdown(&mut self) {
        self.timer.cancel();
        if let Some(socket) = self.socket.take() {
            let _ = socket.send(WireFrame::Close {
                code: CLOSE_NORMAL,
                reason: CLOSE_REASON.to_owned(),
            });
        }
        tracing::debug!("transport worker stopped");
    }
}

async fn next_socket_event(socket: &mut Option<SocketHandle>) -> Option<SocketEvent> {
    match socket.as_mut() {
        Some(socket) => socket.next_event().await,
        None => std::future::pending().await,
    }
}

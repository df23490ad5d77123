//! Socket seam between the client and the underlying WebSocket.
//!
//! [`SocketConnector`] opens a URL and yields a [`SocketHandle`]: an
//! outbound frame sender plus an inbound event receiver, bridged to the
//! network by spawned read and write tasks. The production implementation
//! is [`TungsteniteConnector`]; tests inject an in-memory connector and
//! drive the lifecycle deterministically.
//!
//! Exactly one handle exists per client at a time. Replacing it on
//! reconnect is the only mutation point; the old handle is discarded and
//! never reused, which ends its tasks as their channels close.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::TransportError;

/// WebSocket close code for a normal, acknowledged shutdown.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code reported when the peer vanishes without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Reason attached to client-initiated close frames.
pub const CLOSE_REASON: &str = "client disconnect";

/// Channel depth between the worker and the socket tasks.
const FRAME_BUFFER: usize = 64;

/// One discrete unit of data exchanged over the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireFrame {
    /// Structured text frame (JSON).
    Text(String),
    /// Raw binary frame, sent verbatim with no envelope.
    Binary(Vec<u8>),
    /// Close handshake frame.
    Close {
        /// WebSocket close code.
        code: u16,
        /// Human-readable reason.
        reason: String,
    },
}

/// Lifecycle events delivered by the socket tasks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SocketEvent {
    /// A frame arrived from the server.
    Frame(WireFrame),
    /// A transport-level fault. A close event follows.
    Error(String),
    /// The connection ended.
    Closed {
        /// Close code from the peer, or [`CLOSE_ABNORMAL`] when absent.
        code: u16,
        /// Reason supplied by the peer, if any.
        reason: String,
    },
}

/// Handle to one live connection.
#[derive(Debug)]
pub struct SocketHandle {
    outbound: mpsc::Sender<WireFrame>,
    inbound: mpsc::Receiver<SocketEvent>,
}

impl SocketHandle {
    /// Create a handle plus the channel ends a connector drives.
    ///
    /// Connectors feed inbound events through the returned sender and
    /// drain outbound frames from the returned receiver.
    #[must_use]
    pub fn channel() -> (
        Self,
        mpsc::Receiver<WireFrame>,
        mpsc::Sender<SocketEvent>,
    ) {
        let (outbound_tx, outbound_rx) = mpsc::channel(FRAME_BUFFER);
        let (inbound_tx, inbound_rx) = mpsc::channel(FRAME_BUFFER);
        (
            Self {
                outbound: outbound_tx,
                inbound: inbound_rx,
            },
            outbound_rx,
            inbound_tx,
        )
    }

    /// Queue an outbound frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::SendFailed`] when the write task is gone
    /// or the buffer is full.
    pub fn send(&self, frame: WireFrame) -> Result<(), TransportError> {
        self.outbound
            .try_send(frame)
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    /// Receive the next lifecycle event.
    ///
    /// Returns `None` once the read task has gone away.
    pub async fn next_event(&mut self) -> Option<SocketEvent> {
        self.inbound.recv().await
    }
}

/// Opens connections for the client.
#[async_trait]
pub trait SocketConnector: Send + Sync {
    /// Open `url` and return a live handle.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionFailed`] when the endpoint
    /// cannot be reached or the handshake is rejected.
    async fn connect(&self, url: &str) -> Result<SocketHandle, TransportError>;
}

/// Production connector over `tokio-tungstenite`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl SocketConnector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<SocketHandle, TransportError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(spawn_io(stream))
    }
}

/// Bridge an established stream to channel-based IO.
fn spawn_io(stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> SocketHandle {
    let (handle, mut outbound_rx, inbound_tx) = SocketHandle::channel();
    let (mut write, mut read) = stream.split();

    // Write task: outbound frames -> sink. A close frame ends the task.
    tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let closing = matches!(frame, WireFrame::Close { .. });
            if let Err(e) = write.send(to_tungstenite(frame)).await {
                tracing::debug!(error = %e, "write failed, peer likely gone");
                break;
            }
            if closing {
                break;
            }
        }
    });

    // Read task: stream -> inbound events. Always terminates with Closed.
    tokio::spawn(async move {
        let (code, reason) = loop {
            match read.next().await {
                Some(Ok(Message::Text(text))) => {
                    if inbound_tx
                        .send(SocketEvent::Frame(WireFrame::Text(text)))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Some(Ok(Message::Binary(data))) => {
                    if inbound_tx
                        .send(SocketEvent::Frame(WireFrame::Binary(data)))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    break match frame {
                        Some(f) => (u16::from(f.code), f.reason.to_string()),
                        None => (CLOSE_ABNORMAL, String::new()),
                    };
                }
                // Ping/pong is handled by the protocol layer.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = inbound_tx.send(SocketEvent::Error(e.to_string())).await;
                    break (CLOSE_ABNORMAL, String::new());
                }
                None => break (CLOSE_ABNORMAL, String::new()),
            }
        };
        let _ = inbound_tx.send(SocketEvent::Closed { code, reason }).await;
    });

    handle
}

fn to_tungstenite(frame: WireFrame) -> Message {
    match frame {
        WireFrame::Text(text) => Message::Text(text),
        WireFrame::Binary(data) => Message::Binary(data),
        WireFrame::Close { code, reason } => Message::Close(Some(CloseFrame {
            code: CloseCode::from(code),
            reason: reason.into(),
        })),
    }
}

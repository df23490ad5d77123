//! Consumer-facing events and notifications.
//!
//! The transport layer never raises errors to its callers; everything a
//! UI needs to observe flows through [`ConnectionState`] transitions,
//! dispatched messages, and non-blocking [`Notification`]s.

use serde::{Deserialize, Serialize};

use crate::messages::InboundMessage;

/// Connection lifecycle states. Exactly one is active at any time;
/// transitions drive UI status indicators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection, and none being established.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The channel is open and usable.
    Connected,
    /// A transport-level fault occurred.
    Error,
}

impl ConnectionState {
    /// Human-readable description for status indicators.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
            Self::Error => "Connection error",
        }
    }

    /// Whether the channel is usable for sending.
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Notification severity levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
    /// Success
    Success,
}

/// A non-blocking, user-visible notification.
///
/// Precondition failures, transport faults, and exhausted reconnect
/// attempts all surface this way instead of raising exceptions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity of the notification.
    pub level: NotifyLevel,
    /// Message content.
    pub message: String,
}

impl Notification {
    /// Build a notification at the given level.
    #[must_use]
    pub fn new(level: NotifyLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Events published to subscribed consumers.
#[derive(Clone, Debug)]
pub enum TransportEvent {
    /// The connection state changed.
    StateChanged(ConnectionState),
    /// A parsed inbound message was recorded and dispatched.
    Message(InboundMessage),
    /// A user-visible notification was raised.
    Notification(Notification),
}

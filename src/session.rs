//! Session identity and endpoint resolution.
//!
//! A session is one interview or coding-assessment attempt. The backend
//! exposes one WebSocket endpoint per session kind, parameterized by the
//! session identifier; the scheme and host come from
//! [`crate::config::TransportConfig`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one interview or coding-assessment attempt.
///
/// Assigned by the backend when the session is created; the transport
/// layer treats it as an opaque string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Wrap a raw session identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The kind of real-time session, selecting the destination endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Live interview with streaming media analysis.
    Interview,
    /// Coding assessment with remote execution results.
    Coding,
}

impl SessionKind {
    /// Endpoint path for a session of this kind.
    #[must_use]
    pub fn endpoint_path(self, session_id: &SessionId) -> String {
        match self {
            Self::Interview => format!("/ws/interview/{session_id}"),
            Self::Coding => format!("/ws/coding/{session_id}"),
        }
    }
}

/// Destination of one connection attempt. Immutable once created; a
/// reconnect reuses the same target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionTarget {
    /// The session to attach to.
    pub session_id: SessionId,
    /// Which endpoint family to use.
    pub kind: SessionKind,
}

impl SessionTarget {
    /// Create a target for `session_id`.
    #[must_use]
    pub fn new(session_id: impl Into<SessionId>, kind: SessionKind) -> Self {
        Self {
            session_id: session_id.into(),
            kind,
        }
    }
}

//! Wire message model.
//!
//! Inbound frames are structured JSON text with a mandatory `type`
//! discriminator and a `timestamp` in milliseconds since the Unix epoch.
//! The transport layer resolves the discriminator to a typed payload but
//! never interprets the payload body itself; that is a consumer concern.
//! Frames that fail to parse are dropped and logged, never forwarded.
//!
//! Outbound, the client generates exactly one frame on its own: the
//! authentication frame sent immediately after the channel opens. All
//! other outbound payloads come from callers, either as arbitrary JSON
//! (e.g. [`CodeSubmission`]) or as raw binary media chunks sent verbatim
//! with no envelope.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;

use crate::error::TransportError;
use crate::session::SessionId;

/// One parsed inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub struct InboundMessage {
    /// Session this message belongs to, when the server includes one.
    pub session_id: Option<SessionId>,
    /// Milliseconds since the Unix epoch, as stamped by the server.
    pub timestamp_ms: f64,
    /// Type-specific payload.
    pub payload: MessagePayload,
}

impl InboundMessage {
    /// Parse a text frame.
    ///
    /// Every inbound frame must be a JSON object carrying a string `type`
    /// and a numeric `timestamp`. Unrecognized `type` values parse into
    /// [`MessagePayload::Unknown`] rather than failing.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidFrame`] (or a serde error for
    /// malformed JSON) when the frame does not meet the envelope shape.
    pub fn parse(text: &str) -> Result<Self, TransportError> {
        let value: Value = serde_json::from_str(text)?;
        let obj = value.as_object().ok_or_else(|| {
            TransportError::InvalidFrame("frame is not a JSON object".to_owned())
        })?;
        let kind = obj.get("type").and_then(Value::as_str).ok_or_else(|| {
            TransportError::InvalidFrame("missing string `type` discriminator".to_owned())
        })?;
        let timestamp_ms = obj.get("timestamp").and_then(Value::as_f64).ok_or_else(|| {
            TransportError::InvalidFrame("missing numeric `timestamp`".to_owned())
        })?;
        let session_id = obj
            .get("session_id")
            .and_then(Value::as_str)
            .map(SessionId::from);
        let payload = MessagePayload::from_object(kind, obj);
        Ok(Self {
            session_id,
            timestamp_ms,
            payload,
        })
    }

    /// Server timestamp as a UTC datetime, when representable.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp_ms as i64).single()
    }

    /// The wire discriminator of the payload.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.payload.kind()
    }
}

/// Type-specific payload of an inbound frame, keyed by the wire `type`.
///
/// Payload bodies (`feedback`, `result`, `question`) are opaque to the
/// transport layer and forwarded to consumers untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum MessagePayload {
    /// Server welcome after accepting the connection.
    ConnectionEstablished {
        /// Optional human-readable greeting.
        message: Option<String>,
    },
    /// Live AI feedback during an interview session.
    RealTimeFeedback {
        /// Feedback body, interpreted by consumers.
        feedback: Value,
    },
    /// Result of executing submitted code.
    CodingExecutionResult {
        /// Execution result body, interpreted by consumers.
        result: Value,
    },
    /// A new interview question.
    InterviewQuestion {
        /// Question body, interpreted by consumers.
        question: Value,
    },
    /// Server-side failure report.
    Error {
        /// Failure description, when the server includes one.
        message: Option<String>,
    },
    /// A type this client does not recognize, kept verbatim.
    Unknown {
        /// The unrecognized `type` value.
        kind: String,
        /// The whole frame, untouched.
        data: Value,
    },
}

impl MessagePayload {
    fn from_object(kind: &str, obj: &Map<String, Value>) -> Self {
        let text_field = |name: &str| {
            obj.get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
        };
        let body_field = |name: &str| obj.get(name).cloned().unwrap_or(Value::Null);

        match kind {
            "connection_established" => Self::ConnectionEstablished {
                message: text_field("message"),
            },
            "real_time_feedback" => Self::RealTimeFeedback {
                feedback: body_field("feedback"),
            },
            "coding_execution_result" => Self::CodingExecutionResult {
                result: body_field("result"),
            },
            "interview_question" => Self::InterviewQuestion {
                question: body_field("question"),
            },
            "error" => Self::Error {
                message: text_field("message"),
            },
            other => Self::Unknown {
                kind: other.to_owned(),
                data: Value::Object(obj.clone()),
            },
        }
    }

    /// The wire discriminator for this payload.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::ConnectionEstablished { .. } => "connection_established",
            Self::RealTimeFeedback { .. } => "real_time_feedback",
            Self::CodingExecutionResult { .. } => "coding_execution_result",
            Self::InterviewQuestion { .. } => "interview_question",
            Self::Error { .. } => "error",
            Self::Unknown { kind, .. } => kind,
        }
    }
}

/// Build the authentication frame sent right after the channel opens.
///
/// This is the only message the transport manager generates on its own.
#[must_use]
pub fn auth_frame(token: &str) -> Value {
    json!({ "type": "auth", "token": token })
}

/// Outbound code submission for coding sessions.
///
/// The backend executes the code and answers with a
/// [`MessagePayload::CodingExecutionResult`] frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSubmission {
    /// Source code to execute.
    pub code: String,
    /// Language identifier (e.g. `python`, `javascript`).
    pub language: String,
}

impl CodeSubmission {
    /// Create a submission.
    #[must_use]
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
        }
    }
}

/// Bounded FIFO history of parsed inbound messages.
///
/// Holds every message received since the last explicit clear, plus a
/// pointer to the most recent one. The log is capped by a ring buffer
/// (the upstream behavior of growing without bound is a resource leak,
/// not a contract); the oldest entry is dropped on overflow.
#[derive(Debug)]
pub struct MessageLog {
    entries: VecDeque<InboundMessage>,
    capacity: usize,
    last: Option<InboundMessage>,
}

impl MessageLog {
    /// Create an empty log retaining at most `capacity` messages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
            last: None,
        }
    }

    /// Append a message, evicting the oldest entry when full.
    pub fn push(&mut self, message: InboundMessage) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message.clone());
        self.last = Some(message);
    }

    /// Empty the log and clear the last-message pointer.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last = None;
    }

    /// The most recently recorded message.
    #[must_use]
    pub fn last(&self) -> Option<&InboundMessage> {
        self.last.as_ref()
    }

    /// Snapshot of the retained history, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<InboundMessage> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

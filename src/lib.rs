//! HireSmart Realtime - Session Transport Client
//!
//! This crate is the client-side real-time layer of the HireSmart
//! interview/assessment platform. It owns one WebSocket connection per
//! active interview or coding session and exposes a publish/subscribe
//! surface to the rest of the application. REST resources, the visual
//! layer, and the login flows live elsewhere; this crate only consumes a
//! bearer token and an authenticated flag from an injected
//! [`AuthSource`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Consumers (UI)                      │
//! │   connect / disconnect / send_message / send_binary      │
//! │   state / last_message / messages / subscribe            │
//! └───────────────────────────┬──────────────────────────────┘
//!                             │ commands        events
//! ┌───────────────────────────┼──────────────────────────────┐
//! │                 SESSION TRANSPORT CLIENT                 │
//! │  ┌─────────────────────────────────────────────────────┐ │
//! │  │ event loop: commands · socket events · reconnect    │ │
//! │  │ timer · auth watch (one handler active at a time)   │ │
//! │  └───────────┬──────────────────────┬──────────────────┘ │
//! │      ReconnectPolicy           MessageLog                │
//! └───────────────────────────┬──────────────────────────────┘
//!                             │ ws(s)://…/ws/{kind}/{session}
//!                      HireSmart backend
//! ```
//!
//! # Key Types
//!
//! - [`SessionClient`]: the transport manager; one socket per session
//! - [`TransportEvent`]: state changes, messages, and notifications
//! - [`InboundMessage`] / [`MessagePayload`]: the typed wire model
//! - [`ReconnectPolicy`]: bounded exponential backoff
//! - [`TokenStore`]: concrete [`AuthSource`] fed by the login flow
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use hiresmart_realtime::{
//!     SessionClient, SessionKind, TokenStore, TransportConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let auth = Arc::new(TokenStore::with_token("<bearer token>"));
//!     let client = SessionClient::new(TransportConfig::from_env(), auth);
//!     let mut events = client.subscribe();
//!
//!     client.connect("abc123", SessionKind::Coding);
//!     while let Ok(event) = events.recv().await {
//!         // render state changes, messages, notifications
//!     }
//! }
//! ```
//!
//! # Failure Model
//!
//! Nothing propagates as an error to callers. Precondition failures
//! (connect without auth, send while closed) log and notify; unparseable
//! frames are dropped after logging; transport faults surface the `Error`
//! state plus a notification; unexpected closures drive bounded
//! exponential-backoff reconnection; an exhausted budget is terminal and
//! user-visible.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod messages;
pub mod reconnect;
pub mod session;
pub mod socket;
pub mod timer;

// Re-exports for convenience
pub use auth::{AuthSource, TokenStore};
pub use client::{AttemptId, ConnectionStats, SessionClient};
pub use config::TransportConfig;
pub use error::TransportError;
pub use events::{ConnectionState, Notification, NotifyLevel, TransportEvent};
pub use messages::{auth_frame, CodeSubmission, InboundMessage, MessageLog, MessagePayload};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use session::{SessionId, SessionKind, SessionTarget};
pub use socket::{
    SocketConnector, SocketEvent, SocketHandle, TungsteniteConnector, WireFrame, CLOSE_ABNORMAL,
    CLOSE_NORMAL, CLOSE_REASON,
};
pub use timer::ReconnectTimer;

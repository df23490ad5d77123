//! Transport configuration.
//!
//! Scheme and host of the realtime endpoints come from here; the path is
//! resolved per session kind. Defaults match a local development backend.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::reconnect::ReconnectConfig;
use crate::session::SessionTarget;

/// Configuration for the session transport client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransportConfig {
    /// WebSocket base URL, e.g. `ws://localhost:8000`.
    pub base_url: String,

    /// Reconnection behavior on unexpected closure.
    pub reconnect: ReconnectConfig,

    /// Maximum number of inbound messages retained in the log.
    pub log_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "ws://localhost:8000".to_owned(),
            reconnect: ReconnectConfig::default(),
            log_capacity: 1024,
        }
    }
}

impl TransportConfig {
    /// Create a configuration for `base_url` with default tuning.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `HIRESMART_WS_URL`: WebSocket base URL
    /// - `HIRESMART_RECONNECT_ATTEMPTS`: maximum reconnect attempts
    /// - `HIRESMART_RECONNECT_BASE_MS`: backoff base delay in ms
    /// - `HIRESMART_RECONNECT_MAX_MS`: backoff delay ceiling in ms
    /// - `HIRESMART_LOG_CAPACITY`: retained message count
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let reconnect_defaults = ReconnectConfig::default();

        let millis = |name: &str, fallback: Duration| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(fallback, Duration::from_millis)
        };

        Self {
            base_url: std::env::var("HIRESMART_WS_URL").unwrap_or(defaults.base_url),
            reconnect: ReconnectConfig {
                max_attempts: std::env::var("HIRESMART_RECONNECT_ATTEMPTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(reconnect_defaults.max_attempts),
                base_delay: millis(
                    "HIRESMART_RECONNECT_BASE_MS",
                    reconnect_defaults.base_delay,
                ),
                max_delay: millis("HIRESMART_RECONNECT_MAX_MS", reconnect_defaults.max_delay),
            },
            log_capacity: std::env::var("HIRESMART_LOG_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.log_capacity),
        }
    }

    /// Create a configuration suitable for testing (short delays,
    /// loopback URL).
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            base_url: "ws://127.0.0.1:8000".to_owned(),
            reconnect: ReconnectConfig::for_testing(),
            log_capacity: 64,
        }
    }

    /// Resolve the destination endpoint for `target`.
    #[must_use]
    pub fn endpoint_url(&self, target: &SessionTarget) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            target.kind.endpoint_path(&target.session_id)
        )
    }
}

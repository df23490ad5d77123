//! Authentication source contract.
//!
//! The transport layer reads a bearer token and an authenticated flag; it
//! never writes them. Login and registration flows live elsewhere in the
//! application and feed a [`TokenStore`]. The client observes the flag
//! through a watch channel and forces a disconnect on the transition to
//! unauthenticated; it does not poll.
//!
//! Injecting the source at construction (instead of reaching into shared
//! application context) keeps the transport testable with fakes.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

/// Read-only view of the application's authentication state.
pub trait AuthSource: Send + Sync {
    /// Current bearer token, if any.
    fn bearer_token(&self) -> Option<String>;

    /// Whether the application currently holds a usable token.
    fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some_and(|token| !token.is_empty())
    }

    /// Subscribe to authenticated-flag changes.
    ///
    /// The channel carries `true` while authenticated. The transport
    /// client watches it and disconnects when it flips to `false`.
    fn watch_authenticated(&self) -> watch::Receiver<bool>;
}

/// Shared token store backing [`AuthSource`].
///
/// Cheap to clone; all clones observe the same token.
#[derive(Clone)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
    authenticated_tx: Arc<watch::Sender<bool>>,
}

impl TokenStore {
    /// Create an unauthenticated store.
    #[must_use]
    pub fn new() -> Self {
        let (authenticated_tx, _) = watch::channel(false);
        Self {
            token: Arc::new(RwLock::new(None)),
            authenticated_tx: Arc::new(authenticated_tx),
        }
    }

    /// Create a store already holding `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set_token(token);
        store
    }

    /// Store a token after login.
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        let authenticated = !token.is_empty();
        *self.token.write() = Some(token);
        self.authenticated_tx.send_replace(authenticated);
    }

    /// Drop the token on logout.
    pub fn clear(&self) {
        *self.token.write() = None;
        self.authenticated_tx.send_replace(false);
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSource for TokenStore {
    fn bearer_token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn watch_authenticated(&self) -> watch::Receiver<bool> {
        self.authenticated_tx.subscribe()
    }
}

// Auth credential slice.
// Holds the bearer token material and the logged-in flag derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Bearer token material used to authenticate outbound requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access: String,
    pub refresh: String,
    pub expires: Option<DateTime<Utc>>,
}

impl AuthToken {
    /// Token carrying only an access value, for callers without refresh
    /// material (a personal access token from the environment, say).
    pub fn bearer(access: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: String::new(),
            expires: None,
        }
    }
}

/// Current auth slice state. `is_logged_in` is never written directly; it
/// is recomputed from the access value on every token update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub token: AuthToken,
    pub is_logged_in: bool,
}

/// Owner of the credential. Written rarely, read on every request; readers
/// take a snapshot or hold a watch handle.
pub struct AuthStore {
    tx: watch::Sender<AuthState>,
}

impl AuthStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthState::default());
        Self { tx }
    }

    /// Replace the credential wholesale. The logged-in flag follows the
    /// access value: empty means logged out.
    pub fn set_token(&self, token: AuthToken) {
        let is_logged_in = !token.access.is_empty();
        self.tx.send_replace(AuthState {
            token,
            is_logged_in,
        });
    }

    /// Snapshot of the current slice state.
    pub fn state(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    pub fn token(&self) -> AuthToken {
        self.tx.borrow().token.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.tx.borrow().is_logged_in
    }

    /// Subscribe to credential changes. The dispatcher holds one of these
    /// and reads the latest value per request.
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}

// Application state store.
// Observable slices for the auth credential and client configuration.

pub mod auth;
pub mod config;

pub use auth::{AuthState, AuthStore, AuthToken};
pub use config::{ConfigState, ConfigStore};

/// All state slices, constructed together and shared by reference.
pub struct AppStore {
    pub auth: AuthStore,
    pub config: ConfigStore,
}

impl AppStore {
    pub fn new() -> Self {
        Self {
            auth: AuthStore::new(),
            config: ConfigStore::new(),
        }
    }
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

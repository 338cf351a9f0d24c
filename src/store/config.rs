// Client configuration slice.
// Carries the connectivity flag that drives refetch-on-reconnect.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigState {
    /// Whether the client believes it has connectivity. The false-to-true
    /// edge is the reconnect signal consumers respond to.
    pub online: bool,
}

impl Default for ConfigState {
    fn default() -> Self {
        Self { online: true }
    }
}

pub struct ConfigStore {
    tx: watch::Sender<ConfigState>,
}

impl ConfigStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConfigState::default());
        Self { tx }
    }

    pub fn set_online(&self, online: bool) {
        self.tx.send_modify(|state| state.online = online);
    }

    pub fn is_online(&self) -> bool {
        self.tx.borrow().online
    }

    pub fn state(&self) -> ConfigState {
        self.tx.borrow().clone()
    }

    /// Subscribe to configuration changes.
    pub fn watch(&self) -> watch::Receiver<ConfigState> {
        self.tx.subscribe()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

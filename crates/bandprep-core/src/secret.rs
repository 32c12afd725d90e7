//! API credential storage.
//!
//! Lives in the same key-value store as the session, under its own key.

use std::sync::Arc;

use tracing::warn;

use crate::error::Result;
use crate::storage::{KvStore, SECRET_KEY};

pub struct SecretStore {
    store: Arc<dyn KvStore>,
}

impl SecretStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Stored credential, if any. Read failures count as absent.
    pub fn get(&self) -> Option<String> {
        match self.store.get(SECRET_KEY) {
            Ok(secret) => secret.filter(|s| !s.is_empty()),
            Err(e) => {
                warn!("failed to read API key: {e}");
                None
            }
        }
    }

    /// Store `secret` with surrounding whitespace removed.
    pub fn set(&self, secret: &str) -> Result<()> {
        self.store.set(SECRET_KEY, secret.trim())
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(SECRET_KEY)
    }
}

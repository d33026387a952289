//! In-memory credential holder for the oracle's bearer key.
//!
//! Lives for the session; there is no persistence and no teardown beyond
//! dropping the store.

use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};

#[derive(Debug, Default)]
pub struct CredentialStore {
    key: RwLock<Option<SecretString>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: SecretString) -> Self {
        let store = Self::new();
        store.set(key);
        store
    }

    /// The current credential, if one has been set.
    pub fn get(&self) -> Option<SecretString> {
        self.key
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the credential. Blank keys are ignored; returns whether it was stored.
    pub fn set(&self, key: SecretString) -> bool {
        if key.expose_secret().trim().is_empty() {
            return false;
        }
        let trimmed = SecretString::from(key.expose_secret().trim().to_string());
        *self
            .key
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(trimmed);
        true
    }

    pub fn is_configured(&self) -> bool {
        self.key
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }
}

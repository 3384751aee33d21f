//! Driven port for the durable copy of the session.
//!
//! Two entries are persisted: the credential token and the JSON-serialised
//! identity. Adapters must write and clear them together.

use std::sync::Mutex;

use super::define_port_error;

/// Key of the persisted credential token.
pub const TOKEN_KEY: &str = "authToken";
/// Key of the persisted JSON identity.
pub const IDENTITY_KEY: &str = "authUser";

/// Raw persisted entries. Either may be missing when storage was tampered
/// with or a write was interrupted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedEntries {
    pub token: Option<String>,
    pub identity: Option<String>,
}

impl PersistedEntries {
    pub fn new(token: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            identity: Some(identity.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.identity.is_none()
    }
}

define_port_error! {
    /// Errors raised by session storage adapters.
    pub enum SessionStoreError {
        /// Reading or writing the backing medium failed.
        Io { message: String } => "session storage failed: {message}",
        /// The stored document could not be read back.
        Corrupt { message: String } => "session storage is corrupt: {message}",
    }
}

/// Durable key-value storage for the session entries.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    /// Read whatever is stored.
    fn load(&self) -> Result<PersistedEntries, SessionStoreError>;

    /// Replace both entries in one write.
    fn save(&self, token: &str, identity_json: &str) -> Result<(), SessionStoreError>;

    /// Remove both entries.
    fn clear(&self) -> Result<(), SessionStoreError>;
}

/// Process-local store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: Mutex<PersistedEntries>,
}

impl InMemorySessionStore {
    /// Store seeded with `entries`.
    pub fn with_entries(entries: PersistedEntries) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Copy of the current entries.
    pub fn snapshot(&self) -> PersistedEntries {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn replace(&self, next: PersistedEntries) {
        match self.entries.lock() {
            Ok(mut entries) => *entries = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> Result<PersistedEntries, SessionStoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, token: &str, identity_json: &str) -> Result<(), SessionStoreError> {
        self.replace(PersistedEntries::new(token, identity_json));
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        self.replace(PersistedEntries::default());
        Ok(())
    }
}

//! Session entries persisted as one JSON document in the state directory.
//!
//! The document holds the `authToken` and `authUser` keys side by side and
//! is replaced atomically, so a reader never sees one key without the other
//! unless the file was edited by hand.

use std::io;
use std::path::{Path, PathBuf};

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use serde_json::{Map, Value};

use super::atomic_io::write_atomic;
use crate::domain::ports::{
    IDENTITY_KEY, PersistedEntries, SessionStore, SessionStoreError, TOKEN_KEY,
};

/// File name of the persisted session inside the state directory.
pub const SESSION_FILE_NAME: &str = "session.json";

/// [`SessionStore`] backed by a file in a capability-scoped directory.
#[derive(Debug)]
pub struct FileSessionStore {
    dir: Dir,
    root: PathBuf,
}

impl FileSessionStore {
    /// Open (creating if needed) the state directory.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while creating or opening the directory.
    pub fn open(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        Dir::create_ambient_dir_all(root, ambient_authority())?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        Ok(Self {
            dir,
            root: root.to_path_buf(),
        })
    }

    /// Full path of the session document.
    pub fn location(&self) -> PathBuf {
        self.root.join(SESSION_FILE_NAME)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<PersistedEntries, SessionStoreError> {
        let raw = match self.dir.read_to_string(SESSION_FILE_NAME) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(PersistedEntries::default());
            }
            Err(err) => return Err(SessionStoreError::io(err.to_string())),
        };
        let document: Map<String, Value> = serde_json::from_str(&raw)
            .map_err(|err| SessionStoreError::corrupt(err.to_string()))?;
        Ok(PersistedEntries {
            token: string_entry(&document, TOKEN_KEY),
            identity: string_entry(&document, IDENTITY_KEY),
        })
    }

    fn save(&self, token: &str, identity_json: &str) -> Result<(), SessionStoreError> {
        let mut document = Map::new();
        document.insert(TOKEN_KEY.to_owned(), Value::String(token.to_owned()));
        document.insert(
            IDENTITY_KEY.to_owned(),
            Value::String(identity_json.to_owned()),
        );
        let bytes = serde_json::to_vec_pretty(&Value::Object(document))
            .map_err(|err| SessionStoreError::io(err.to_string()))?;
        write_atomic(&self.dir, SESSION_FILE_NAME, &bytes)
            .map_err(|err| SessionStoreError::io(err.to_string()))
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        match self.dir.remove_file(SESSION_FILE_NAME) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SessionStoreError::io(err.to_string())),
        }
    }
}

fn string_entry(document: &Map<String, Value>, key: &str) -> Option<String> {
    document
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

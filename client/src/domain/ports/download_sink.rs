//! Driven port for saving downloaded attachments.

use std::path::PathBuf;

use super::define_port_error;

/// Where a download ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// Name the file was saved under.
    pub name: String,
    /// Full location on the destination medium.
    pub location: PathBuf,
    pub size_bytes: u64,
}

define_port_error! {
    /// Errors raised while persisting a download.
    pub enum DownloadSinkError {
        /// The suggested name cannot be used as a file name.
        InvalidName { name: String } => "invalid file name: {name}",
        /// Writing the payload failed; nothing was left behind.
        Write { message: String } => "could not save file: {message}",
    }
}

/// Destination for downloaded payloads. Implementations must not leave a
/// partial file behind when a write fails.
#[cfg_attr(test, mockall::automock)]
pub trait DownloadSink: Send + Sync {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<SavedFile, DownloadSinkError>;
}

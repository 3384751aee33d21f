//! Filesystem adapters scoped to one directory each through cap-std.

mod atomic_io;
mod directory_sink;
mod file_session_store;

pub use directory_sink::DirectorySink;
pub use file_session_store::{FileSessionStore, SESSION_FILE_NAME};

//! Client library for the task board API.
//!
//! The crate keeps local copies of remote collections (projects, tasks, users
//! and the authenticated session) in sync through a fixed asynchronous
//! lifecycle, derives which mutating actions a user may be offered, and moves
//! file attachments in both directions.
//!
//! Layout follows a hexagonal split:
//! - [`domain`] owns entities, slices, permissions, file transfer rules and the
//!   ports it drives.
//! - [`outbound`] holds the reqwest gateway and the filesystem adapters.
//! - [`inbound`] holds the command-line driving adapter.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::ClientSettings;
pub use domain::{ApiFailure, ClientContext, Session};

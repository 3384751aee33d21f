//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed [`ApiGateway`](crate::domain::ports::ApiGateway)
//! - **storage**: cap-std backed session store and download directory
//!
//! Adapters translate between domain types and transport representations.
//! They contain no business logic.

pub mod http;
pub mod storage;

pub use http::{GatewayBuildError, HttpGateway, normalize_base_url};
pub use storage::{DirectorySink, FileSessionStore};

//! HTTP adapter for the task board API.

mod gateway;

pub use gateway::{GatewayBuildError, HttpGateway, normalize_base_url};

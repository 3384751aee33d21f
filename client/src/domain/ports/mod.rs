//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod api_gateway;
mod download_sink;
mod session_store;

#[cfg(test)]
pub use api_gateway::MockApiGateway;
pub use api_gateway::{
    ApiGateway, ApiRequest, Blob, BlobFetchError, HttpMethod, RequestBody, decode_data,
    decode_field,
};
#[cfg(test)]
pub use download_sink::MockDownloadSink;
pub use download_sink::{DownloadSink, DownloadSinkError, SavedFile};
#[cfg(test)]
pub use session_store::MockSessionStore;
pub use session_store::{
    IDENTITY_KEY, InMemorySessionStore, PersistedEntries, SessionStore, SessionStoreError,
    TOKEN_KEY,
};

//! Driven port for the single egress point to the task board API.
//!
//! Slices describe requests with [`ApiRequest`] and receive either the
//! decoded JSON body or an [`ApiFailure`] that has already been classified.
//! Binary downloads use a separate call because their error branch still
//! carries a body that the file transfer service has to inspect.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::define_port_error;
use crate::domain::error::ApiFailure;
use crate::domain::upload::{SelectedFile, UPLOAD_FIELD_NAME, UploadBatch};

/// HTTP verbs used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Files sent as repeated parts under one field name.
    Multipart {
        field: &'static str,
        files: Vec<SelectedFile>,
    },
}

/// Transport-agnostic description of one API call.
///
/// `path` is relative to the API base URL and carries no leading slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    fn new(method: HttpMethod, path: impl Into<String>, body: RequestBody) -> Self {
        let path = path.into();
        Self {
            method,
            path: path.trim_start_matches('/').to_owned(),
            query: Vec::new(),
            body,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path, RequestBody::Empty)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path, RequestBody::Empty)
    }

    /// POST without a body.
    pub fn post_empty(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path, RequestBody::Empty)
    }

    /// POST with a JSON body.
    pub fn post<T: Serialize + ?Sized>(
        path: impl Into<String>,
        payload: &T,
    ) -> Result<Self, ApiFailure> {
        Ok(Self::new(HttpMethod::Post, path, RequestBody::Json(encode(payload)?)))
    }

    /// PUT with a JSON body.
    pub fn put<T: Serialize + ?Sized>(
        path: impl Into<String>,
        payload: &T,
    ) -> Result<Self, ApiFailure> {
        Ok(Self::new(HttpMethod::Put, path, RequestBody::Json(encode(payload)?)))
    }

    /// POST a validated upload batch as multipart form data.
    pub fn multipart(path: impl Into<String>, batch: UploadBatch) -> Self {
        Self::new(
            HttpMethod::Post,
            path,
            RequestBody::Multipart {
                field: UPLOAD_FIELD_NAME,
                files: batch.into_files(),
            },
        )
    }

    /// Append a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// JSON body, if any.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            RequestBody::Json(value) => Some(value),
            RequestBody::Empty | RequestBody::Multipart { .. } => None,
        }
    }
}

fn encode<T: Serialize + ?Sized>(payload: &T) -> Result<Value, ApiFailure> {
    serde_json::to_value(payload)
        .map_err(|err| ApiFailure::decode(format!("request body could not be encoded: {err}")))
}

/// Opaque binary payload with the content type the server declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(mime_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self { mime_type, bytes }
    }

    /// Whether the declared type is `application/json`, ignoring case and
    /// parameters such as `charset`.
    pub fn is_json(&self) -> bool {
        self.mime_type.as_deref().is_some_and(|mime| {
            mime.split(';')
                .next()
                .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
        })
    }
}

define_port_error! {
    /// Errors surfaced while fetching a binary payload.
    pub enum BlobFetchError {
        /// No response reached the client.
        Transport { message: String } => "download transport failed: {message}",
        /// The server answered with a non-success status; the body is kept
        /// verbatim so the caller can look inside it.
        Rejected { status: u16, body: Blob } => "download rejected with status {status}",
    }
}

/// Port every slice and the file transfer service call through.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiGateway: Send + Sync {
    /// Perform a JSON call and return the decoded body.
    ///
    /// An empty success body comes back as [`Value::Null`]. Non-success
    /// statuses are classified into [`ApiFailure`].
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiFailure>;

    /// Fetch a binary payload. Error responses arrive as blobs too.
    async fn fetch_blob(&self, path: &str) -> Result<Blob, BlobFetchError>;
}

/// Decode a resource from either a `{ "data": ... }` envelope or a bare body.
pub fn decode_data<T: DeserializeOwned>(body: Value) -> Result<T, ApiFailure> {
    let inner = match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(inner).map_err(|err| ApiFailure::decode(err.to_string()))
}

/// Decode one named field of an object body, such as `user` or `token`.
pub fn decode_field<T: DeserializeOwned>(body: &Value, field: &str) -> Result<T, ApiFailure> {
    let value = body
        .get(field)
        .cloned()
        .ok_or_else(|| ApiFailure::decode(format!("response is missing `{field}`")))?;
    serde_json::from_value(value).map_err(|err| ApiFailure::decode(err.to_string()))
}

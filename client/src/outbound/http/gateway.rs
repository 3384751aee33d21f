//! Reqwest-backed API gateway.
//!
//! This adapter owns transport details only: base URL joining, default
//! headers, bearer injection, multipart encoding and status mapping. A 401
//! on a request that carried a credential expires the shared session before
//! the failure is returned, unless a newer sign-in replaced that credential.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::domain::ports::{ApiGateway, ApiRequest, Blob, BlobFetchError, HttpMethod, RequestBody};
use crate::domain::upload::SelectedFile;
use crate::domain::{ApiFailure, Credential, ErrorBody, Session};

const REQUESTED_WITH: &str = "X-Requested-With";

/// Errors raised while building the gateway.
#[derive(Debug, Error)]
pub enum GatewayBuildError {
    #[error("invalid base URL `{value}`: {reason}")]
    InvalidBaseUrl { value: String, reason: String },
    #[error("HTTP client could not be constructed: {0}")]
    Client(#[from] reqwest::Error),
}

/// Trim, require http(s) and force a trailing slash so relative resource
/// paths resolve beneath the API prefix.
///
/// # Errors
///
/// Returns [`GatewayBuildError::InvalidBaseUrl`] for unparsable input or a
/// non-HTTP scheme.
pub fn normalize_base_url(raw: &str) -> Result<Url, GatewayBuildError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| GatewayBuildError::InvalidBaseUrl {
        value: trimmed.to_owned(),
        reason,
    };
    let mut url = Url::parse(trimmed).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// [`ApiGateway`] over one reqwest client and the shared session.
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    session: Arc<Session>,
}

impl HttpGateway {
    /// Build a gateway with the API's default headers and a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL is invalid or the reqwest client
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Arc<Session>,
    ) -> Result<Self, GatewayBuildError> {
        let base_url = normalize_base_url(base_url)?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, path: &str, query: &[(String, String)]) -> Result<Url, ApiFailure> {
        let mut url = resolve(&self.base_url, path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Attach the bearer token when one exists. Returns the token sent.
    fn authorize(&self, builder: RequestBuilder) -> (RequestBuilder, Option<Credential>) {
        match self.session.credential() {
            Some(credential) => (builder.bearer_auth(credential.expose()), Some(credential)),
            None => (builder, None),
        }
    }

    /// A 401 only expires the session that issued the request.
    fn reject_credential(&self, status: StatusCode, sent: Option<&Credential>) {
        if let Some(credential) = sent.filter(|_| status == StatusCode::UNAUTHORIZED) {
            self.session.expire_credential(credential);
        }
    }
}

#[async_trait]
impl ApiGateway for HttpGateway {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiFailure> {
        let ApiRequest {
            method,
            path,
            query,
            body,
        } = request;
        let url = self.url_for(&path, &query)?;
        debug!(method = method.as_str(), %url, "sending request");
        let builder = attach_body(self.client.request(reqwest_method(method), url), body)?;
        let (builder, sent_credential) = self.authorize(builder);

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            self.reject_credential(status, sent_credential.as_ref());
            return Err(map_status_error(status, bytes.as_ref()));
        }
        parse_success_body(bytes.as_ref())
    }

    async fn fetch_blob(&self, path: &str) -> Result<Blob, BlobFetchError> {
        let url = resolve(&self.base_url, path)
            .map_err(|failure| BlobFetchError::transport(failure.to_string()))?;
        debug!(%url, "fetching blob");
        let builder = self.client.get(url).header(ACCEPT, "*/*");
        let (builder, sent_credential) = self.authorize(builder);

        let response = builder
            .send()
            .await
            .map_err(|err| BlobFetchError::transport(err.to_string()))?;
        let status = response.status();
        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response
            .bytes()
            .await
            .map_err(|err| BlobFetchError::transport(err.to_string()))?;
        let blob = Blob::new(mime_type, bytes.to_vec());
        if status.is_success() {
            Ok(blob)
        } else {
            self.reject_credential(status, sent_credential.as_ref());
            Err(BlobFetchError::rejected(status.as_u16(), blob))
        }
    }
}

fn resolve(base_url: &Url, path: &str) -> Result<Url, ApiFailure> {
    base_url
        .join(path.trim_start_matches('/'))
        .map_err(|err| ApiFailure::transport(format!("invalid request path `{path}`: {err}")))
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn attach_body(builder: RequestBuilder, body: RequestBody) -> Result<RequestBuilder, ApiFailure> {
    match body {
        RequestBody::Empty => Ok(builder),
        RequestBody::Json(value) => Ok(builder.json(&value)),
        RequestBody::Multipart { field, files } => {
            let form = files.iter().try_fold(Form::new(), |form, file| {
                Ok::<_, ApiFailure>(form.part(field, file_part(file)?))
            })?;
            Ok(builder.multipart(form))
        }
    }
}

fn file_part(file: &SelectedFile) -> Result<Part, ApiFailure> {
    Part::bytes(file.contents().to_vec())
        .file_name(file.name().to_owned())
        .mime_str(file.mime_type())
        .map_err(|err| ApiFailure::invalid(format!("{}: {err}", file.name())))
}

fn parse_success_body(body: &[u8]) -> Result<Value, ApiFailure> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|err| ApiFailure::decode(err.to_string()))
}

fn map_transport_error(error: reqwest::Error) -> ApiFailure {
    if error.is_decode() {
        ApiFailure::decode(error.to_string())
    } else {
        ApiFailure::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ApiFailure {
    ApiFailure::from_status(status.as_u16(), ErrorBody::from_slice(body))
}

//! Failure taxonomy for calls against the task board API.
//!
//! Every failure leaving the gateway is one of the [`ApiFailure`] variants, so
//! slices and callers pattern-match instead of probing response shapes. The
//! `Display` output is the flat, human-readable string a slice stores in its
//! `error` field; callers never need transport-specific branching.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Message shown when no response reached the client.
pub const NO_CONNECTION_MESSAGE: &str = "Unable to reach the server. Check your connection.";
/// Message shown when the server (or a client-side check) denies an action.
pub const NOT_AUTHORIZED_MESSAGE: &str = "Action not authorized.";
/// Message shown when a 401 arrives without a body message.
pub const UNAUTHENTICATED_MESSAGE: &str = "Your session is no longer valid. Please sign in again.";
/// Message shown when a 404 arrives without a body message.
pub const NOT_FOUND_MESSAGE: &str = "The requested resource was not found.";
/// Message shown when a response body cannot be interpreted.
pub const UNPARSEABLE_MESSAGE: &str = "The server response could not be interpreted.";
/// Prefix placed before concatenated field-level validation messages.
pub const VALIDATION_PREFIX: &str = "Invalid data: ";

const UNPROCESSABLE_ENTITY: u16 = 422;

/// Coarse failure class, used by callers that branch on category only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The server rejected submitted data.
    Validation,
    /// The caller is not authenticated or not permitted.
    Authorization,
    /// The target resource does not exist.
    NotFound,
    /// No response reached the client.
    Transport,
    /// A response arrived but could not be interpreted.
    Decode,
    /// Any other non-success response.
    Server,
}

/// Tagged failure union constructed at the gateway boundary.
///
/// ## Invariants
/// - `Display` never exposes transport internals; `Transport::detail` and
///   `Decode::detail` are kept for logs only.
///
/// # Examples
/// ```
/// use client::domain::{ApiFailure, ErrorBody};
///
/// let failure = ApiFailure::from_status(404, ErrorBody::with_message("Proyecto no encontrado"));
/// assert_eq!(failure.to_string(), "Proyecto no encontrado");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiFailure {
    /// The request never produced a response.
    #[error("Unable to reach the server. Check your connection.")]
    Transport {
        /// Underlying transport description.
        detail: String,
    },
    /// The server rejected the submitted data (HTTP 422).
    #[error("{}", render_validation(.message, .field_errors))]
    Validation {
        /// Top-level message returned alongside the field errors.
        message: String,
        /// Field-level messages keyed by field name.
        field_errors: BTreeMap<String, Vec<String>>,
    },
    /// The credential was missing or rejected (HTTP 401).
    #[error("{message}")]
    Unauthenticated {
        /// Human-readable message.
        message: String,
    },
    /// The caller is authenticated but not permitted (HTTP 403 or a local check).
    #[error("{message}")]
    Forbidden {
        /// Human-readable message.
        message: String,
    },
    /// The resource vanished or never existed (HTTP 404).
    #[error("{message}")]
    NotFound {
        /// Human-readable message.
        message: String,
    },
    /// Any other non-success status.
    #[error("{message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Human-readable message.
        message: String,
    },
    /// A response arrived but its body could not be interpreted.
    #[error("The server response could not be interpreted.")]
    Decode {
        /// Underlying decode description.
        detail: String,
    },
}

fn render_validation(message: &str, field_errors: &BTreeMap<String, Vec<String>>) -> String {
    let fields = field_errors
        .values()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>();
    if fields.is_empty() {
        message.to_owned()
    } else {
        format!("{VALIDATION_PREFIX}{}", fields.join(", "))
    }
}

impl ApiFailure {
    /// Classify a non-success response.
    ///
    /// 422 with field errors becomes [`ApiFailure::Validation`]; 401, 403 and
    /// 404 map to their dedicated variants; anything else keeps its status.
    /// A body `message` is preferred over the per-status fallback.
    pub fn from_status(status: u16, body: ErrorBody) -> Self {
        let ErrorBody { message, errors } = body;
        match status {
            UNPROCESSABLE_ENTITY => Self::Validation {
                message: message.unwrap_or_else(|| "Invalid data.".to_owned()),
                field_errors: errors,
            },
            401 => Self::Unauthenticated {
                message: message.unwrap_or_else(|| UNAUTHENTICATED_MESSAGE.to_owned()),
            },
            403 => Self::Forbidden {
                message: message.unwrap_or_else(|| NOT_AUTHORIZED_MESSAGE.to_owned()),
            },
            404 => Self::NotFound {
                message: message.unwrap_or_else(|| NOT_FOUND_MESSAGE.to_owned()),
            },
            _ => Self::Server {
                status,
                message: message
                    .unwrap_or_else(|| format!("Request failed with status {status}.")),
            },
        }
    }

    /// Transport failure with a diagnostic detail.
    pub fn transport(detail: impl Into<String>) -> Self {
        Self::Transport {
            detail: detail.into(),
        }
    }

    /// Decode failure with a diagnostic detail.
    pub fn decode(detail: impl Into<String>) -> Self {
        Self::Decode {
            detail: detail.into(),
        }
    }

    /// Local or remote refusal with an explicit message.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Blunt refusal used by client-side preconditions.
    pub fn not_authorized() -> Self {
        Self::forbidden(NOT_AUTHORIZED_MESSAGE)
    }

    /// Client-side validation failure without field detail.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    /// Coarse category of this failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } => FailureKind::Transport,
            Self::Validation { .. } => FailureKind::Validation,
            Self::Unauthenticated { .. } | Self::Forbidden { .. } => FailureKind::Authorization,
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Server { .. } => FailureKind::Server,
            Self::Decode { .. } => FailureKind::Decode,
        }
    }

    /// HTTP status implied by the variant, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Validation { .. } => Some(UNPROCESSABLE_ENTITY),
            Self::Unauthenticated { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Server { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Decode { .. } => None,
        }
    }

    /// Flat string stored in a slice's `error` field.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Error body shape returned by the API: `{ message?, errors?: { field: [..] } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    /// Generic message field.
    pub message: Option<String>,
    /// Field-level validation messages.
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ErrorBody {
    /// Body carrying only a message.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            errors: BTreeMap::new(),
        }
    }

    /// Leniently extract the error shape from an arbitrary JSON value.
    ///
    /// Field errors may be arrays of strings or single strings; anything else
    /// is ignored. Blank messages count as absent.
    pub fn from_json(value: &Value) -> Self {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_owned);
        let errors = value
            .get("errors")
            .and_then(Value::as_object)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|(field, messages)| {
                        let collected = match messages {
                            Value::String(single) => vec![single.clone()],
                            Value::Array(many) => many
                                .iter()
                                .filter_map(Value::as_str)
                                .map(str::to_owned)
                                .collect(),
                            _ => Vec::new(),
                        };
                        (!collected.is_empty()).then(|| (field.clone(), collected))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { message, errors }
    }

    /// Parse raw response bytes, treating non-JSON bodies as empty.
    pub fn from_slice(bytes: &[u8]) -> Self {
        serde_json::from_slice::<Value>(bytes)
            .map(|value| Self::from_json(&value))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests;

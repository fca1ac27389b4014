//! Error types for the Shlink API client.
//!
//! # Design
//! Transport failures are owned by the transport and reach the caller
//! untouched through `ApiError::Transport`. The client adds only the
//! failures it can cause itself: options that are not a JSON object, a
//! response that lacks the field an operation unwraps, and a field whose
//! shape does not match the return type.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures raised by a `Transport`.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded as JSON.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Any other failure from a custom transport.
    #[error(transparent)]
    Other(#[from] BoxError),
}

impl TransportError {
    /// HTTP status of the failed response, if the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors returned by `ShlinkApiClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response did not contain the field at `pointer` (RFC 6901).
    #[error("response is missing `{pointer}`")]
    MissingField { pointer: String },

    #[error("unexpected response shape: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// Caller-supplied options did not serialize to a JSON object.
    #[error("options must serialize to a JSON object, got {found}")]
    InvalidOptions { found: &'static str },
}

/// Errors raised while loading a `ServerConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid server url: {0}")]
    InvalidUrl(String),

    #[error("invalid api version `{0}`")]
    InvalidVersion(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display_is_preserved() {
        let err: ApiError = TransportError::Status {
            status: 404,
            body: "not found".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "HTTP 404: not found");
    }

    #[test]
    fn status_is_only_reported_for_status_errors() {
        let err = TransportError::Status {
            status: 500,
            body: String::new(),
        };
        assert_eq!(err.status(), Some(500));
        assert_eq!(TransportError::Network("refused".into()).status(), None);
    }

    #[test]
    fn missing_field_names_the_pointer() {
        let err = ApiError::MissingField {
            pointer: "/visits/data".to_string(),
        };
        assert_eq!(err.to_string(), "response is missing `/visits/data`");
    }

    #[test]
    fn invalid_options_names_the_json_kind() {
        let err = ApiError::InvalidOptions { found: "array" };
        assert_eq!(err.to_string(), "options must serialize to a JSON object, got array");
    }
}

//! Error types for the blog API client.
//!
//! # Design
//! `ApiError` is the one failure shape callers see for anything that went
//! wrong on the wire: a transport failure, a structured error body, or an
//! unstructured one. The backend's body is trusted only after it parses as
//! that shape; everything else collapses to [`ApiError::unexpected`].
//! `ClientError` wraps it together with the few failures that happen on our
//! side of the wire (credential store, payload encoding, success-body
//! decoding).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used when a failure carries no usable error body.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error has occurred";

/// A single field-level validation failure reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Normalized failure returned for every unsuccessful call.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("HTTP {status}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }

    /// The fallback used when no structured error body is available.
    pub fn unexpected() -> Self {
        Self::new(500, UNEXPECTED_ERROR_MESSAGE)
    }

    /// Parse a failure body into an `ApiError`.
    ///
    /// The body is used verbatim only when it is a JSON object with a
    /// numeric `status`, a string `message`, and either no `errors` or a
    /// well-formed list of them. Unknown extra fields are ignored. Any other
    /// body, including an empty one, yields [`ApiError::unexpected`].
    pub fn from_failure_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self::unexpected())
    }
}

/// Errors raised by a [`crate::CredentialStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential store is corrupt: {0}")]
    Format(#[from] serde_json::Error),

    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// No response was received for a request.
///
/// `ReqwestTransport` only produces `Request`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// For `Transport` implementations not built on reqwest; carries the
    /// underlying cause as text.
    #[error("connection failed: {0}")]
    Connection(String),
}

/// Errors returned by [`crate::BlogClient`] methods.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The call failed on the wire. Always normalized.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Reading the credential failed, so the request was never sent.
    #[error(transparent)]
    CredentialStore(#[from] StoreError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A successful response body did not match the expected type.
    #[error("deserialization failed: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ClientError {
    /// The normalized API error, if this is a wire failure.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_body_is_used_verbatim() {
        let body = r#"{"status":400,"message":"Validation failed","errors":[{"field":"name","message":"must not be blank"}]}"#;
        let err = ApiError::from_failure_body(body);
        assert_eq!(err.status, 400);
        assert_eq!(err.message, "Validation failed");
        let errors = err.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
    }

    #[test]
    fn structured_body_round_trips() {
        let original = ApiError {
            status: 409,
            message: "Category has posts".to_string(),
            errors: Some(vec![FieldError {
                field: "id".to_string(),
                message: "in use".to_string(),
            }]),
        };
        let body = serde_json::to_string(&original).unwrap();
        assert_eq!(ApiError::from_failure_body(&body), original);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let err = ApiError::from_failure_body(
            r#"{"status":404,"message":"Not found","timestamp":"now"}"#,
        );
        assert_eq!(err, ApiError::new(404, "Not found"));
    }

    #[test]
    fn empty_body_falls_back() {
        assert_eq!(ApiError::from_failure_body(""), ApiError::unexpected());
    }

    #[test]
    fn plain_text_body_falls_back() {
        assert_eq!(
            ApiError::from_failure_body("Bad Gateway"),
            ApiError::unexpected()
        );
    }

    #[test]
    fn partially_matching_body_falls_back() {
        // message missing
        assert_eq!(
            ApiError::from_failure_body(r#"{"status":400}"#),
            ApiError::unexpected()
        );
        // status has the wrong type
        assert_eq!(
            ApiError::from_failure_body(r#"{"status":"400","message":"x"}"#),
            ApiError::unexpected()
        );
        // malformed field errors
        assert_eq!(
            ApiError::from_failure_body(r#"{"status":400,"message":"x","errors":[{"field":1}]}"#),
            ApiError::unexpected()
        );
    }

    #[test]
    fn fallback_has_fixed_shape() {
        let err = ApiError::unexpected();
        assert_eq!(err.status, 500);
        assert_eq!(err.message, "An unexpected error has occurred");
        assert!(err.errors.is_none());
        assert_eq!(err.to_string(), "HTTP 500: An unexpected error has occurred");
    }
}

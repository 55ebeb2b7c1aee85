//! API error types for the farm client.

use reqwest::StatusCode;
use thiserror::Error;

/// Message used whenever the server gives no usable `detail`.
pub const FALLBACK_MESSAGE: &str = "Request failed";

/// Errors that can occur when talking to the farm backend.
///
/// `Display` is the message a page shows to the user. Transport and parse
/// failures render as the generic fallback.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the credential (HTTP 401).
    ///
    /// The session has already been cleared by the time this is returned.
    #[error("{0}")]
    Unauthenticated(String),

    /// Validation or business failure reported by the server.
    #[error("{message}")]
    Rejected {
        /// The HTTP status returned.
        status: StatusCode,
        /// The server's `detail` message, or the fallback.
        message: String,
    },

    /// Network or HTTP transport error.
    #[error("Request failed")]
    Network(#[from] reqwest::Error),

    /// A success response whose body could not be decoded.
    #[error("Request failed")]
    InvalidResponse(String),

    /// The request body could not be serialized.
    #[error("Request failed")]
    Serialize(#[source] serde_json::Error),

    /// A header name or value could not be sent.
    #[error("Request failed")]
    InvalidHeader(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code and the `detail` message.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthenticated(message),
            _ => ApiError::Rejected { status, message },
        }
    }

    /// Whether this error means the session is no longer valid.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Unauthenticated(_))
    }

    /// The HTTP status, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthenticated(_) => Some(StatusCode::UNAUTHORIZED),
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Network(err) => err.status(),
            ApiError::InvalidResponse(_) | ApiError::Serialize(_) | ApiError::InvalidHeader(_) => {
                None
            }
        }
    }
}

/// Extract the `detail` message from an error body.
///
/// Returns the fallback message when the body is empty, is not JSON, or has
/// no string `detail` field.
pub fn detail_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("detail")
                .and_then(|d| d.as_str())
                .filter(|d| !d.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_status_401() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "Invalid token.");
        assert!(err.is_unauthenticated());
        assert_eq!(err.to_string(), "Invalid token.");
    }

    #[test]
    fn test_error_from_status_400() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "Invalid phone number");
        match err {
            ApiError::Rejected { status, ref message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "Invalid phone number");
            }
            _ => panic!("Expected Rejected error"),
        }
        assert_eq!(err.to_string(), "Invalid phone number");
    }

    #[test]
    fn test_error_from_status_403_is_not_unauthenticated() {
        let err = ApiError::from_status(StatusCode::FORBIDDEN, "nope");
        assert!(!err.is_unauthenticated());
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_detail_message_extracted() {
        assert_eq!(
            detail_message(r#"{"detail": "Cow not found"}"#),
            "Cow not found"
        );
    }

    #[test]
    fn test_detail_message_fallbacks() {
        assert_eq!(detail_message(""), FALLBACK_MESSAGE);
        assert_eq!(detail_message("<html>oops</html>"), FALLBACK_MESSAGE);
        assert_eq!(detail_message(r#"{"error": "x"}"#), FALLBACK_MESSAGE);
        assert_eq!(detail_message(r#"{"detail": 42}"#), FALLBACK_MESSAGE);
        assert_eq!(detail_message(r#"{"detail": ""}"#), FALLBACK_MESSAGE);
    }

    #[test]
    fn test_invalid_response_displays_fallback() {
        let err = ApiError::InvalidResponse("expected value at line 1".to_string());
        assert_eq!(err.to_string(), FALLBACK_MESSAGE);
        assert_eq!(err.status(), None);
    }
}

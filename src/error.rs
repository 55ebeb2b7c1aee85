//! Top-level error for the dashboard front end.
//!
//! Library layers keep their own error enums. [`AppError`] gathers them at
//! the point where something is shown to the farm user.

use thiserror::Error;

use crate::api::error::ApiError;
use crate::config::ConfigError;
use crate::session::StorageError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A failed backend call. Its text is already user-facing.
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Storage(#[from] StorageError),
}

impl AppError {
    /// Text for a notification or the CLI's error line.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api(e) => e.to_string(),
            AppError::Config(ConfigError::ValidationError(msg)) => {
                format!("Invalid settings: {}", msg)
            }
            AppError::Config(ConfigError::ParseError(_)) => {
                "The settings file is not valid TOML.".to_string()
            }
            AppError::Config(ConfigError::NoConfigDir) => {
                "No configuration directory is available on this system.".to_string()
            }
            AppError::Config(_) => "The settings file could not be read or saved.".to_string(),
            AppError::Storage(_) => "The saved login could not be accessed.".to_string(),
        }
    }

    /// The session is gone and the user has to sign in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, AppError::Api(e) if e.is_unauthenticated())
    }

    /// Errors worth a warning in the log rather than a debug line.
    pub fn is_critical(&self) -> bool {
        match self {
            AppError::Api(_) => self.requires_login(),
            AppError::Config(_) | AppError::Storage(_) => true,
        }
    }

    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::ValidationError(_) | ConfigError::ParseError(_)) => {
                Some("Fix config.toml or set KOIMERET_API_URL.")
            }
            AppError::Api(ApiError::Unauthenticated(_)) => {
                Some("Run 'koimeret login' to sign in again.")
            }
            AppError::Api(ApiError::Network(_)) => Some("Check the connection and the API URL."),
            AppError::Storage(_) => {
                Some("Set credential_store = \"file\" when no keyring is available.")
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_expired_session_requires_login() {
        let err = AppError::from(ApiError::Unauthenticated("Invalid token.".to_string()));
        assert!(err.requires_login());
        assert!(err.is_critical());
        assert_eq!(err.user_message(), "Invalid token.");
        assert!(err.suggested_action().unwrap().contains("koimeret login"));
    }

    #[test]
    fn test_rejected_request_is_not_critical() {
        let err = AppError::from(ApiError::from_status(
            StatusCode::BAD_REQUEST,
            "Tag number already exists",
        ));
        assert_eq!(err.user_message(), "Tag number already exists");
        assert!(!err.is_critical());
        assert!(err.suggested_action().is_none());
    }

    #[test]
    fn test_invalid_settings() {
        let err = AppError::from(ConfigError::ValidationError(
            "api_url cannot be empty".to_string(),
        ));
        assert_eq!(err.user_message(), "Invalid settings: api_url cannot be empty");
        assert!(err.suggested_action().is_some());
    }

    #[test]
    fn test_storage_failure() {
        let err = AppError::from(StorageError::Keyring("locked".to_string()));
        assert!(err.is_critical());
        assert!(!err.requires_login());
    }
}

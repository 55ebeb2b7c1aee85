//! Application settings configuration.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// Default API base URL for a local backend.
pub const DEFAULT_API_URL: &str = "http://localhost:8021/api/v1";

/// Where the session credential is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// The OS keyring.
    #[default]
    Keyring,
    /// A JSON file in the local data directory.
    File,
    /// Nothing is persisted; the session ends with the process.
    Memory,
}

/// Which side of the dashboard a user lands on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Owner,
    Worker,
}

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the farm API, including the version prefix.
    pub api_url: String,
    /// Where the session credential is stored.
    pub credential_store: CredentialBackend,
    /// The dashboard to open after login.
    pub default_role: Role,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            credential_store: CredentialBackend::default(),
            default_role: Role::default(),
        }
    }
}

impl Settings {
    /// Validate these settings.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` if the API URL is empty or
    /// does not use http(s).
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api_url cannot be empty".to_string(),
            ));
        }

        if !self.api_url.starts_with("https://") && !self.api_url.starts_with("http://") {
            return Err(ConfigError::ValidationError(format!(
                "api_url '{}' must start with http:// or https://",
                self.api_url
            )));
        }

        Ok(())
    }
}

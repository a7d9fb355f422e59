//! Error types for cplice-core

use thiserror::Error;

/// Result type alias using cplice-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for cplice
#[derive(Error, Debug)]
pub enum Error {
    /// Credential file missing, unreadable or malformed
    #[error("Credential configuration unavailable at {path}: {reason}")]
    ConfigUnavailable { path: String, reason: String },

    /// No credential entry for a registry host
    #[error("No credentials found for registry host '{host}'")]
    CredentialNotFound { host: String },

    /// Invalid runtime configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config unavailable error
    pub fn config_unavailable(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::ConfigUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a credential not found error
    pub fn credential_not_found(host: impl Into<String>) -> Self {
        Self::CredentialNotFound { host: host.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

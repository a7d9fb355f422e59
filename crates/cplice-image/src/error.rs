//! Error types for registry access and splicing

use cplice_core::retry::{HttpStatusError, HttpStatusPredicate, RetryPredicate};
use thiserror::Error;

/// Result type alias using [`RegistryError`]
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors raised while talking to a registry or splicing images
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Image reference is not `host/path:tag`
    #[error("Malformed image reference '{reference}': {reason}")]
    MalformedReference { reference: String, reason: String },

    /// Credential lookup failed
    #[error(transparent)]
    Credentials(#[from] cplice_core::Error),

    /// Connection, TLS or timeout failure
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Registry answered a read with a non-success status
    #[error("Registry returned {status} for {url}: {body}")]
    Status { status: u16, url: String, body: String },

    /// Response body is not the expected document
    #[error("Failed to parse {what} from {url}: {source}")]
    Parse {
        what: &'static str,
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Blob content does not hash to the digest it was fetched by
    #[error("Digest mismatch for blob {expected}: content hashes to {actual}")]
    DigestMismatch { expected: String, actual: String },

    /// Blob upload rejected
    #[error("Blob upload failed ({status}): {body}")]
    UploadFailed { status: u16, body: String },

    /// Manifest publish rejected
    #[error("Manifest publish failed ({status}): {body}")]
    PublishFailed { status: u16, body: String },

    /// Host already pooled with the opposite TLS verification setting
    #[error("Registry host '{host}' is already in use with TLS verification {existing}; refusing to reuse it with verification {requested}")]
    ConflictingTlsPolicy {
        host: String,
        existing: bool,
        requested: bool,
    },

    /// Layer count and `rootfs.diff_ids` count disagree
    #[error("Image {image} has {layers} layer(s) but {diff_ids} diff_id(s)")]
    LayerMismatch {
        image: String,
        layers: usize,
        diff_ids: usize,
    },

    /// Failed to serialize a document for upload
    #[error("Failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client for {host}: {source}")]
    ClientBuild {
        host: String,
        #[source]
        source: reqwest::Error,
    },
}

impl RegistryError {
    pub fn malformed_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    pub fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            url: url.into(),
            source,
        }
    }

    pub fn parse(what: &'static str, url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            what,
            url: url.into(),
            source,
        }
    }

    /// Whether a read that failed this way may succeed when repeated
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } | Self::Status { .. } => {
                HttpStatusPredicate::default_http().should_retry(self)
            }
            _ => false,
        }
    }
}

impl HttpStatusError for RegistryError {
    fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. }
            | Self::UploadFailed { status, .. }
            | Self::PublishFailed { status, .. } => Some(*status),
            Self::Http { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

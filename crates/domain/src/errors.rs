//! Error types used throughout the pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Schedulr
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SchedulrError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Every extraction provider failed or returned nothing usable.
    #[error("Extraction exhausted: {0}")]
    ExtractionExhausted(String),

    /// The user has no credential for the requested calendar.
    #[error("Account not linked: {0}")]
    AccountNotLinked(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Calendar insert exhausted: {0}")]
    InsertExhausted(String),
}

impl SchedulrError {
    /// Single human-readable reply for the transport layer.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ExtractionExhausted(_) => "No events found in forwarded messages.",
            Self::AccountNotLinked(_) => "Link your calendar account to schedule events.",
            _ => "Failed to create events. Try later.",
        }
    }
}

/// Result type alias for Schedulr operations
pub type Result<T> = std::result::Result<T, SchedulrError>;

/// Classified failure reported by an external provider (extraction model or
/// calendar API).
///
/// `retryable` decides whether the same provider is attempted again.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{provider}{}: {message}", .status.map(|s| format!(" returned {s}")).unwrap_or_default())]
pub struct ApiError {
    pub provider: String,
    pub status: Option<u16>,
    pub message: String,
    pub retryable: bool,
}

impl ApiError {
    /// Transient failure; the call may be attempted again.
    pub fn retryable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self { provider: provider.into(), status: None, message: message.into(), retryable: true }
    }

    /// Permanent failure; retrying the same provider is pointless.
    pub fn permanent(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self { provider: provider.into(), status: None, message: message.into(), retryable: false }
    }

    /// Classify an HTTP status returned by a provider.
    ///
    /// 429 and 500/502/503/504 are transient, everything else is permanent.
    pub fn from_status(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            status: Some(status),
            message: message.into(),
            retryable: is_retryable_status(status),
        }
    }
}

/// Whether an HTTP status code denotes a transient provider failure.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

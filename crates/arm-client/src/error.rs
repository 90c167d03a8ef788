//! ARM client errors

use thiserror::Error;

/// Errors that can occur when interacting with Azure Resource Manager
#[derive(Debug, Error)]
pub enum ArmError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// ARM returned an error response
    #[error("ARM API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication failed (invalid or expired token, missing role assignment)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists, or a conditional request was rejected
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Throttling or server-side failure that may succeed later
    #[error("Transient error: {0}")]
    Transient(String),

    /// Invalid request (e.g., malformed resource ID)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ArmError {
    /// Returns true for 404 responses
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArmError::NotFound(_))
    }

    /// Returns true for 409/412 responses
    pub fn is_conflict(&self) -> bool {
        matches!(self, ArmError::Conflict(_))
    }

    /// Returns true for throttling, 5xx and connection-level failures
    pub fn is_transient(&self) -> bool {
        match self {
            ArmError::Transient(_) => true,
            ArmError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Classifies a non-success HTTP status into an error
    pub fn from_status(status: reqwest::StatusCode, context: String) -> Self {
        match status.as_u16() {
            401 | 403 => ArmError::Authentication(context),
            404 => ArmError::NotFound(context),
            409 | 412 => ArmError::Conflict(context),
            408 | 429 | 500..=599 => ArmError::Transient(context),
            _ => ArmError::Api(context),
        }
    }
}

//! # Enrollment Error Types
//!
//! Unified error handling for the gateway, reconciliation, and bulk reassignment layers.

use thiserror::Error;

/// Enrollment operation result type
pub type EnrollmentResult<T> = Result<T, EnrollmentError>;

/// Error taxonomy for enrollment operations
///
/// Reconciliation gaps have no variant: a student with no recoverable
/// competency data degrades to an empty list and is only logged.
#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {message}")]
    Auth {
        status: Option<u16>,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid response: {field} - {reason}")]
    InvalidResponse { field: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Bulk operation partially failed: {succeeded} succeeded, {failed} failed ({})", .reasons.join("; "))]
    PartialBulkFailure {
        succeeded: usize,
        failed: usize,
        reasons: Vec<String>,
    },

    #[error("Bulk operation failed: {}", .reasons.join("; "))]
    BulkFailed { reasons: Vec<String> },

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Invalid bulk transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },
}

impl EnrollmentError {
    /// Create an API error from a non-success HTTP response
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an authentication error; `status` is `None` when no credential was available
    pub fn auth(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Auth {
            status,
            message: message.into(),
        }
    }

    /// Create a validation (precondition) error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an invalid response error for upstream payloads that cannot be normalized
    pub fn invalid_response(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Network failures and 5xx responses
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            EnrollmentError::Http(_) => true,
            EnrollmentError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Missing, expired, or rejected credentials. Fatal to the whole view.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, EnrollmentError::Auth { .. })
    }

    /// Preconditions that failed before any network call
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, EnrollmentError::Validation(_))
    }
}

impl From<::config::ConfigError> for EnrollmentError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

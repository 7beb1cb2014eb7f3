//! Error types for secret resolution.
//!
//! Every failure inside the secrets subsystem (transport errors, unexpected
//! status codes, response bodies of the wrong shape) collapses into
//! [`SecretsError::Internal`]. The cause is logged where it is detected; the
//! caller only ever sees the fixed message below.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Message shown to end users for any internal failure.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "Something went wrong. Please retry in sometime or contact support team";

/// Result type for secrets operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors returned by the secrets subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretsError {
    /// Identity provider or secret store call failed. Not retried here.
    #[error("{}", INTERNAL_ERROR_MESSAGE)]
    Internal,
}

impl SecretsError {
    /// Create an internal error.
    pub fn internal() -> Self {
        Self::Internal
    }

    /// HTTP status an inbound request should fail with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Internal => 500,
        }
    }

    /// Build the JSON body an HTTP layer sends back for this error.
    pub fn to_response(&self) -> ErrorBody {
        ErrorBody {
            status_code: self.status_code(),
            error: "Internal Server Error".to_string(),
            message: self.to_string(),
            trace_id: None,
            timestamp: Utc::now(),
        }
    }
}

/// Serialisable error response.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorBody {
    /// Attach the trace id of the inbound request.
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

//! # Error Handling
//!
//! Crate-level errors raised while starting up: loading configuration,
//! validating it, and building HTTP clients. Operations on secrets return
//! [`SecretsError`](crate::secrets::SecretsError) instead, which converts into
//! [`Error`] for callers that mix both.

/// Custom result type for sfk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sfk
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration loaded but failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Outbound HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Secret resolution failed
    #[error(transparent)]
    Secrets(#[from] crate::secrets::SecretsError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status an inbound request should fail with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Secrets(err) => err.status_code(),
            _ => 500,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::Config {
            message: "Configuration loading failed".to_string(),
            source: Some(Box::new(error)),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string()))
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::SecretsError;

    #[test]
    fn test_error_creation() {
        let error = Error::config("missing config directory");
        assert!(matches!(error, Error::Config { .. }));
        assert_eq!(error.to_string(), "Configuration error: missing config directory");
        assert_eq!(error.status_code(), 500);
    }

    #[test]
    fn test_secrets_error_is_transparent() {
        let error: Error = SecretsError::Internal.into();
        assert_eq!(error.to_string(), SecretsError::Internal.to_string());
        assert_eq!(error.status_code(), 500);
    }

    #[test]
    fn test_validation_status() {
        assert_eq!(Error::validation("bad").status_code(), 400);
    }

    #[test]
    fn test_config_error_conversion() {
        let config_error = config::ConfigError::NotFound("hashicorp.projectId".to_string());
        let error: Error = config_error.into();
        assert!(matches!(error, Error::Config { source: Some(_), .. }));
    }
}

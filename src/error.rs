//! Error types for client operations.

use serde::Deserialize;
use thiserror::Error;

/// A single field-tagged error returned by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub field: Option<String>,
    pub message: String,
}

/// Primary error type for all client operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token string failed structural or claim-decoding checks.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Single-flight guard rejected a second concurrent signup.
    #[error("Duplicate request")]
    DuplicateRequest,

    /// Field-tagged validation errors from the identity service.
    #[error("Validation failed: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// Connection-level failure or unusable response body.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service rejected the ambient credentials (HTTP 401).
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() {
            Self::Transport("connection failed".to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(field) => format!("{field}: {}", e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AuthError>;

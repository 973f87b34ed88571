//! Application error types
//!
//! Unified error handling for the chat client. Infrastructure failures
//! reported through the domain port are lifted into their own variants so
//! callers can branch on recoverability without inspecting domain codes.

use chat_core::DomainError;
use serde::Serialize;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No token, or the server rejected it. Fatal until a new token is supplied.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Transport failure; state is left untouched
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out: {0}")]
    Timeout(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A response arrived for a request that has since been superseded
    #[error("Stale response")]
    StaleResponse,

    /// The persistent connection is down; sending is disabled
    #[error("Not connected")]
    NotConnected,

    #[error(transparent)]
    Domain(DomainError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Get error code for the rendering layer
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "AUTHENTICATION_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StaleResponse => "STALE_RESPONSE",
            Self::NotConnected => "NOT_CONNECTED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Worth retrying once the transport recovers
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_) | Self::NotConnected)
    }

    /// Nothing will succeed until the identity changes
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// Rejected locally before any network call
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Validation(_) => true,
            Self::Domain(e) => e.is_validation(),
            _ => false,
        }
    }

    /// Create an authentication error
    #[must_use]
    pub fn authentication(msg: impl fmt::Display) -> Self {
        Self::Authentication(msg.to_string())
    }

    /// Create a network error
    #[must_use]
    pub fn network(msg: impl fmt::Display) -> Self {
        Self::Network(msg.to_string())
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Transport(msg) | DomainError::Decode(msg) => Self::Network(msg),
            DomainError::Unauthorized(msg) => Self::Authentication(msg),
            DomainError::TimedOut(what) => Self::Timeout(what),
            other => Self::Domain(other),
        }
    }
}

/// Error summary handed to the rendering layer as a transient notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorNotice {
    pub code: String,
    pub message: String,
    pub recoverable: bool,
}

impl From<&AppError> for ErrorNotice {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
        }
    }
}

impl From<AppError> for ErrorNotice {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

//! Error types for the push adapter

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Push error types
#[derive(Debug, Error)]
pub enum PushError {
    /// Sender or friend token not configured
    #[error("Token not configured: {0}")]
    MissingToken(String),

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Timeout waiting for the push service
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Service answered with a non-200 business code
    #[error("Push rejected (code {code}): {msg}")]
    Rejected { code: i64, msg: String },

    /// Invalid adapter configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl PushError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingToken(_) | Self::InvalidConfig(_) => ErrorCode::ConfigError,
            Self::Http(_) => ErrorCode::NetworkError,
            Self::Timeout(_) => ErrorCode::TimeoutError,
            Self::Rejected { .. } => ErrorCode::PushFailed,
        }
    }
}

impl From<PushError> for AppError {
    fn from(err: PushError) -> Self {
        AppError::with_message(err.code(), err.to_string())
    }
}

/// Result type for push operations
pub type PushResult<T> = Result<T, PushError>;

//! Client error types

use crate::store::StoreError;
use shared::error::{AppError, ErrorCode};
use shared::feed::RecordError;
use shared::order::OrderError;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Store collaborator failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Lifecycle guard refused the operation
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Feed record failed validation
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Cart line id does not exist
    #[error("Cart line not found: {0}")]
    CartLineNotFound(String),

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Identity file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Store(e) => e.into(),
            ClientError::Order(e) => e.into(),
            ClientError::Record(e) => e.into(),
            ClientError::CartLineNotFound(id) => {
                AppError::with_message(ErrorCode::OrderItemNotFound, format!("Cart line not found: {}", id))
                    .with_detail("line_id", id)
            }
            ClientError::Config(msg) => AppError::config(msg),
            ClientError::Io(e) => AppError::internal(e.to_string()),
            ClientError::Serialization(e) => {
                AppError::with_message(ErrorCode::InvalidFormat, e.to_string())
            }
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

//! Order lifecycle errors

use super::OrderStatus;
use crate::error::{AppError, ErrorCode};
use thiserror::Error;

/// Guard failures raised before any write reaches the store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("Order {id}: transition {from} -> {to} is not allowed")]
    InvalidTransition {
        id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Order {id} changed to {actual} (expected {expected})")]
    StatusChanged {
        id: String,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    #[error("Order {id} is {status} and can no longer be edited")]
    NotEditable { id: String, status: OrderStatus },

    #[error("Order {id} is {status} and can no longer be hurried")]
    NotEscalatable { id: String, status: OrderStatus },

    #[error("Order {0} is not in the trash")]
    NotDeleted(String),

    #[error("Order has no items")]
    EmptyOrder,

    #[error("Line {0} does not exist")]
    LineNotFound(usize),

    #[error("Quantity must be positive")]
    InvalidQuantity,
}

impl OrderError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidTransition { .. } => ErrorCode::OrderInvalidTransition,
            Self::StatusChanged {
                actual: OrderStatus::Completed,
                ..
            } => ErrorCode::OrderAlreadyCompleted,
            Self::StatusChanged { .. } => ErrorCode::OrderInvalidTransition,
            Self::NotEditable { .. } => ErrorCode::OrderNotEditable,
            Self::NotEscalatable { .. } => ErrorCode::OrderNotEscalatable,
            Self::NotDeleted(_) => ErrorCode::OrderNotDeleted,
            Self::EmptyOrder => ErrorCode::OrderEmpty,
            Self::LineNotFound(_) => ErrorCode::OrderItemNotFound,
            Self::InvalidQuantity => ErrorCode::OrderInvalidQuantity,
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let app = AppError::with_message(err.code(), err.to_string());
        match err {
            OrderError::InvalidTransition { id, from, to } => app
                .with_detail("order_id", id)
                .with_detail("from", from.as_str())
                .with_detail("to", to.as_str()),
            OrderError::StatusChanged { id, expected, actual } => app
                .with_detail("order_id", id)
                .with_detail("expected", expected.as_str())
                .with_detail("actual", actual.as_str()),
            OrderError::NotEditable { id, status } | OrderError::NotEscalatable { id, status } => {
                app.with_detail("order_id", id)
                    .with_detail("status", status.as_str())
            }
            OrderError::NotDeleted(id) => app.with_detail("order_id", id),
            OrderError::LineNotFound(index) => app.with_detail("line", index),
            OrderError::EmptyOrder | OrderError::InvalidQuantity => app,
        }
    }
}

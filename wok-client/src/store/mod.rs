//! Store collaborator interface
//!
//! The store owns the authoritative rows, assigns ids and creation
//! timestamps, and publishes one change feed per table. Order updates are
//! compare-and-set: a patch planned against a status the row no longer has is
//! refused with [`StoreError::Rejected`]. Callers never retry.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::feed::RawChange;
use shared::models::{MenuItem, MenuItemCreate, MenuItemPatch, Order, OrderDraft, OrderPatch};
use shared::order::OrderError;
use thiserror::Error;
use tokio::sync::broadcast;

/// Store failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The row changed since the patch was planned
    #[error("Write refused: {0}")]
    Rejected(OrderError),
}

impl StoreError {
    pub fn order_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Order",
            id: id.into(),
        }
    }

    pub fn menu_item_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Menu item",
            id: id.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        if let StoreError::Rejected(e) = err {
            return e.into();
        }
        let code = match &err {
            StoreError::Transport(_) => ErrorCode::NetworkError,
            StoreError::Constraint(_) => ErrorCode::StoreError,
            StoreError::NotFound { entity: "Order", .. } => ErrorCode::OrderNotFound,
            StoreError::NotFound { .. } => ErrorCode::MenuItemNotFound,
            StoreError::Rejected(e) => e.code(),
        };
        tracing::error!(error = %err, error_code = %code, "Store error occurred");
        AppError::with_message(code, err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Order table
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn list_orders(&self) -> StoreResult<Vec<Order>>;

    async fn get_order(&self, id: &str) -> StoreResult<Order>;

    /// Insert a draft; the store assigns id and `created_at`
    async fn insert_order(&self, draft: OrderDraft) -> StoreResult<Order>;

    /// Apply a partial update and return the resulting row
    ///
    /// The patch is checked with [`shared::order::check_patch`] against the
    /// row as stored, atomically with the write.
    async fn update_order(&self, id: &str, patch: OrderPatch) -> StoreResult<Order>;

    /// Permanently remove a row
    async fn delete_order(&self, id: &str) -> StoreResult<()>;

    /// Subscribe to the order table's change feed
    fn subscribe_orders(&self) -> broadcast::Receiver<RawChange>;
}

/// Menu table
#[async_trait]
pub trait MenuStore: Send + Sync {
    async fn list_menu_items(&self) -> StoreResult<Vec<MenuItem>>;

    async fn get_menu_item(&self, id: &str) -> StoreResult<MenuItem>;

    async fn insert_menu_item(&self, item: MenuItemCreate) -> StoreResult<MenuItem>;

    async fn update_menu_item(&self, id: &str, patch: MenuItemPatch) -> StoreResult<MenuItem>;

    async fn delete_menu_item(&self, id: &str) -> StoreResult<()>;

    /// Subscribe to the menu table's change feed
    fn subscribe_menu(&self) -> broadcast::Receiver<RawChange>;
}

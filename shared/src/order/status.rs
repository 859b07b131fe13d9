//! Order status state machine
//!
//! ```text
//! pending ──▶ cooking ──▶ completed
//!    │           │
//!    ├──▶ rejected
//!    └───────────┴──▶ cancelled
//!
//! any non-deleted ──▶ deleted ──▶ pending (restore)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Cooking,
    Completed,
    Rejected,
    Cancelled,
    /// Soft-deleted, sits in the trash until restored or purged
    Deleted,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Cooking,
        OrderStatus::Completed,
        OrderStatus::Rejected,
        OrderStatus::Cancelled,
        OrderStatus::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Cooking => "cooking",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Deleted => "deleted",
        }
    }

    /// Human label used in notifications and listings
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Waiting",
            Self::Cooking => "Cooking",
            Self::Completed => "Ready",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
            Self::Deleted => "Deleted",
        }
    }

    /// Terminal statuses accept no further work
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Rejected | Self::Cancelled | Self::Deleted
        )
    }

    /// Whether the order shows up in normal listings
    pub fn is_listed(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Deleted)
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether `self → to` is a legal transition
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        can_transition(*self, to)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transition table
///
/// Self-transitions are never legal: re-entering a status would re-run its
/// side effects.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    match (from, to) {
        (Pending, Cooking) => true,
        (Cooking, Completed) => true,
        (Pending, Rejected) => true,
        (Pending | Cooking, Cancelled) => true,
        (Deleted, Pending) => true,
        (Deleted, Deleted) => false,
        (_, Deleted) => true,
        _ => false,
    }
}

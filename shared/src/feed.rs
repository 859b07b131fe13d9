//! Change-feed boundary types
//!
//! The store publishes one feed per table. Each event carries the full row as
//! untyped JSON; [`RawChange::decode`] validates it into a typed [`Change`]
//! before anything downstream sees it.

use crate::error::{AppError, ErrorCode};
use crate::models::{MenuItem, Order};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Kind of row change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// Table a change belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Order,
    MenuItem,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::MenuItem => "menu_item",
        }
    }
}

/// Untyped change event as published by the store
///
/// For deletes `record` only needs to carry the `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawChange {
    pub kind: ChangeKind,
    pub entity: EntityKind,
    pub record: Value,
}

/// Validated change event
#[derive(Debug, Clone, PartialEq)]
pub enum Change<T> {
    Inserted(T),
    Updated(T),
    Deleted { id: String },
}

impl<T: Record> Change<T> {
    pub fn id(&self) -> &str {
        match self {
            Self::Inserted(record) | Self::Updated(record) => record.id(),
            Self::Deleted { id } => id,
        }
    }
}

/// Feed boundary failures
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Record has no id")]
    MissingId,

    #[error("Expected a {expected} record, got {actual}")]
    EntityMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Malformed {entity} record {id}: {source}")]
    Malformed {
        entity: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        AppError::with_message(ErrorCode::MalformedRecord, err.to_string())
    }
}

/// A row type that travels on a change feed
pub trait Record: Clone + DeserializeOwned + Send + Sync + 'static {
    const ENTITY: EntityKind;

    fn id(&self) -> &str;

    /// Last-modified stamp; rows without one are never treated as stale
    fn updated_at(&self) -> Option<i64> {
        None
    }
}

impl Record for Order {
    const ENTITY: EntityKind = EntityKind::Order;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> Option<i64> {
        self.updated_at
    }
}

impl Record for MenuItem {
    const ENTITY: EntityKind = EntityKind::MenuItem;

    fn id(&self) -> &str {
        &self.id
    }
}

fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl RawChange {
    pub fn new(kind: ChangeKind, entity: EntityKind, record: Value) -> Self {
        Self {
            kind,
            entity,
            record,
        }
    }

    /// Identity of the affected row, if present
    pub fn id(&self) -> Option<String> {
        record_id(&self.record)
    }

    /// Validate into a typed change
    ///
    /// Rows without an id are rejected. Deletes only need the id.
    pub fn decode<T: Record>(&self) -> Result<Change<T>, RecordError> {
        if self.entity != T::ENTITY {
            return Err(RecordError::EntityMismatch {
                expected: T::ENTITY.as_str(),
                actual: self.entity.as_str(),
            });
        }
        let id = self.id().ok_or(RecordError::MissingId)?;
        if self.kind == ChangeKind::Deleted {
            return Ok(Change::Deleted { id });
        }

        let record: T = serde_json::from_value(self.record.clone()).map_err(|source| {
            RecordError::Malformed {
                entity: T::ENTITY.as_str(),
                id,
                source,
            }
        })?;
        Ok(match self.kind {
            ChangeKind::Inserted => Change::Inserted(record),
            _ => Change::Updated(record),
        })
    }
}

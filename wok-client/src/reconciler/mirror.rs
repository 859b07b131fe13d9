//! Local mirror of one table

use shared::feed::{Change, RawChange, Record};
use std::collections::BTreeMap;

/// Outcome of applying one change: the row before and after
///
/// A skipped change reports the untouched row as both.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied<T> {
    pub previous: Option<T>,
    pub current: Option<T>,
}

/// Read-through copy of a table, keyed by id
#[derive(Debug, Clone)]
pub struct Mirror<T: Record> {
    rows: BTreeMap<String, T>,
}

impl<T: Record> Default for Mirror<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Record> Mirror<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole mirror with a full listing
    pub fn seed(&mut self, rows: Vec<T>) {
        self.rows = rows
            .into_iter()
            .map(|row| (row.id().to_string(), row))
            .collect();
    }

    /// Apply one validated change
    ///
    /// An insert for a known id is a replay and is skipped. An update older
    /// than the mirrored row is skipped; an update for an unknown id inserts
    /// it. Deleting an unknown id is a no-op.
    pub fn apply(&mut self, change: Change<T>) -> Applied<T> {
        match change {
            Change::Inserted(row) => {
                if let Some(existing) = self.rows.get(row.id()) {
                    tracing::debug!(entity = T::ENTITY.as_str(), id = %row.id(), "Skipping replayed insert");
                    return Self::unchanged(existing);
                }
                self.upsert(row)
            }
            Change::Updated(row) => {
                if let Some(existing) = self.rows.get(row.id())
                    && is_stale(&row, existing)
                {
                    tracing::debug!(entity = T::ENTITY.as_str(), id = %row.id(), "Skipping stale update");
                    return Self::unchanged(existing);
                }
                self.upsert(row)
            }
            Change::Deleted { id } => Applied {
                previous: self.rows.remove(&id),
                current: None,
            },
        }
    }

    fn upsert(&mut self, row: T) -> Applied<T> {
        let previous = self.rows.insert(row.id().to_string(), row.clone());
        Applied {
            previous,
            current: Some(row),
        }
    }

    fn unchanged(row: &T) -> Applied<T> {
        Applied {
            previous: Some(row.clone()),
            current: Some(row.clone()),
        }
    }

    /// Validate and apply a raw feed event; malformed rows are dropped
    pub fn apply_raw(&mut self, raw: &RawChange) -> Option<Applied<T>> {
        match raw.decode::<T>() {
            Ok(change) => Some(self.apply(change)),
            Err(e) => {
                tracing::warn!(entity = T::ENTITY.as_str(), error = %e, "Dropping malformed feed record");
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.rows.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    /// Owned copy of all rows
    pub fn snapshot(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }
}

fn is_stale<T: Record>(incoming: &T, existing: &T) -> bool {
    matches!(
        (incoming.updated_at(), existing.updated_at()),
        (Some(incoming), Some(existing)) if incoming < existing
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::feed::{ChangeKind, EntityKind};
    use shared::models::{Category, MenuItem, Order, OrderDraft, OrderLineItem};
    use shared::order::OrderStatus;

    fn item(id: &str, price: i64) -> MenuItem {
        serde_json::from_value(json!({
            "id": id,
            "name": format!("dish {}", id),
            "price": price,
            "category": "main"
        }))
        .unwrap()
    }

    fn order(status: OrderStatus, updated_at: i64) -> Order {
        let line = OrderLineItem::from_menu_item(&item("m-1", 10), 1);
        let mut order = OrderDraft::new("client-1", vec![line]).into_order("o-1".to_string(), 1_000);
        order.status = status;
        order.updated_at = Some(updated_at);
        order
    }

    #[test]
    fn test_duplicate_insert_keeps_row() {
        let mut mirror = Mirror::new();
        mirror.apply(Change::Inserted(item("m-1", 10)));
        let applied = mirror.apply(Change::Inserted(item("m-1", 12)));
        assert_eq!(mirror.len(), 1);
        assert_eq!(mirror.get("m-1").unwrap().price, 10);
        assert_eq!(applied.previous, applied.current);
    }

    #[test]
    fn test_insert_replayed_after_update() {
        let mut mirror = Mirror::new();
        mirror.seed(vec![order(OrderStatus::Cooking, 2_000)]);

        let applied = mirror.apply(Change::Inserted(order(OrderStatus::Pending, 1_000)));
        assert_eq!(applied.current.unwrap().status, OrderStatus::Cooking);
        assert_eq!(mirror.get("o-1").unwrap().status, OrderStatus::Cooking);
    }

    #[test]
    fn test_stale_update_dropped() {
        let mut mirror = Mirror::new();
        mirror.seed(vec![order(OrderStatus::Completed, 3_000)]);

        mirror.apply(Change::Updated(order(OrderStatus::Cooking, 2_000)));
        assert_eq!(mirror.get("o-1").unwrap().status, OrderStatus::Completed);

        // Same stamp is not older
        mirror.apply(Change::Updated(order(OrderStatus::Deleted, 3_000)));
        assert_eq!(mirror.get("o-1").unwrap().status, OrderStatus::Deleted);
    }

    #[test]
    fn test_update_unknown_inserts() {
        let mut mirror: Mirror<MenuItem> = Mirror::new();
        let applied = mirror.apply(Change::Updated(item("m-2", 12)));
        assert!(applied.previous.is_none());
        assert_eq!(mirror.get("m-2").unwrap().category, Category::Main);
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut mirror: Mirror<MenuItem> = Mirror::new();
        mirror.seed(vec![item("m-1", 10)]);
        let applied = mirror.apply(Change::Deleted {
            id: "zzz".to_string(),
        });
        assert_eq!(applied.previous, None);
        assert_eq!(mirror.len(), 1);
    }

    #[test]
    fn test_apply_raw_drops_malformed() {
        let mut mirror: Mirror<MenuItem> = Mirror::new();
        let raw = RawChange::new(ChangeKind::Inserted, EntityKind::MenuItem, json!({"name": "x"}));
        assert!(mirror.apply_raw(&raw).is_none());
        assert!(mirror.is_empty());
    }
}

//! Change reconciliation
//!
//! Applies the order feed to the local mirror and classifies what changed.
//! Every event is diffed against the mirror state immediately before it, so
//! two quick updates to one order yield two independent diffs even when they
//! arrive in the same batch.

mod mirror;

pub use mirror::{Applied, Mirror};

use shared::feed::{Change, RawChange};
use shared::models::Order;
use shared::order::OrderStatus;

/// Classified order transition
#[derive(Debug, Clone, PartialEq)]
pub enum OrderChange {
    /// Id not present in the previous snapshot
    NewOrder(Order),
    /// Status differs from the previous snapshot
    StatusChanged {
        order: Order,
        from: OrderStatus,
        to: OrderStatus,
    },
    /// `urgent` became true or `urgent_count` went up
    UrgencyEscalated { order: Order, previous_count: u32 },
}

impl OrderChange {
    pub fn order(&self) -> &Order {
        match self {
            Self::NewOrder(order) => order,
            Self::StatusChanged { order, .. } => order,
            Self::UrgencyEscalated { order, .. } => order,
        }
    }
}

/// Diff one row against its previous state
pub fn diff(previous: Option<&Order>, current: &Order) -> Vec<OrderChange> {
    let Some(prev) = previous else {
        return vec![OrderChange::NewOrder(current.clone())];
    };

    let mut changes = Vec::new();
    if prev.status != current.status {
        changes.push(OrderChange::StatusChanged {
            order: current.clone(),
            from: prev.status,
            to: current.status,
        });
    }
    if current.urgent && (!prev.urgent || current.urgent_count > prev.urgent_count) {
        changes.push(OrderChange::UrgencyEscalated {
            order: current.clone(),
            previous_count: prev.urgent_count,
        });
    }
    changes
}

/// Order mirror plus transition detection
#[derive(Debug, Default)]
pub struct OrderReconciler {
    mirror: Mirror<Order>,
}

impl OrderReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to a full listing; produces no changes
    pub fn seed(&mut self, orders: Vec<Order>) {
        tracing::debug!(count = orders.len(), "Order mirror seeded");
        self.mirror.seed(orders);
    }

    /// Apply one validated change and classify it
    pub fn apply(&mut self, change: Change<Order>) -> Vec<OrderChange> {
        let applied = self.mirror.apply(change);
        match applied.current {
            Some(current) => diff(applied.previous.as_ref(), &current),
            None => Vec::new(),
        }
    }

    /// Validate and apply a raw event; malformed rows are dropped
    pub fn apply_raw(&mut self, raw: &RawChange) -> Vec<OrderChange> {
        match raw.decode::<Order>() {
            Ok(change) => self.apply(change),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed order record");
                Vec::new()
            }
        }
    }

    /// Apply events in receipt order, each diffed against its predecessor
    pub fn apply_batch<'a>(&mut self, batch: impl IntoIterator<Item = &'a RawChange>) -> Vec<OrderChange> {
        batch
            .into_iter()
            .flat_map(|raw| self.apply_raw(raw))
            .collect()
    }

    pub fn mirror(&self) -> &Mirror<Order> {
        &self.mirror
    }

    pub fn get(&self, id: &str) -> Option<&Order> {
        self.mirror.get(id)
    }

    pub fn orders(&self) -> Vec<Order> {
        self.mirror.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::feed::{ChangeKind, EntityKind};
    use shared::models::{OrderDraft, OrderLineItem, QuickOptions};

    fn order(id: &str) -> Order {
        let line = OrderLineItem {
            id: "m-1".to_string(),
            name: "麻婆豆腐".to_string(),
            price: 19,
            quantity: 2,
            special_request: "none".to_string(),
            quick_options: QuickOptions::default(),
            category: None,
            image: None,
        };
        OrderDraft::new("client-1", vec![line]).into_order(id.to_string(), 1_000)
    }

    fn raw(kind: ChangeKind, order: &Order) -> RawChange {
        RawChange::new(kind, EntityKind::Order, serde_json::to_value(order).unwrap())
    }

    #[test]
    fn test_seed_produces_no_changes() {
        let mut rec = OrderReconciler::new();
        rec.seed(vec![order("a"), order("b")]);
        assert_eq!(rec.mirror().len(), 2);

        // Re-delivery of a seeded row is not new
        let changes = rec.apply_raw(&raw(ChangeKind::Inserted, &order("a")));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_new_order_detected_once() {
        let mut rec = OrderReconciler::new();
        let o = order("a");
        let first = rec.apply_raw(&raw(ChangeKind::Inserted, &o));
        let second = rec.apply_raw(&raw(ChangeKind::Inserted, &o));
        assert_eq!(first, vec![OrderChange::NewOrder(o)]);
        assert!(second.is_empty());
        assert_eq!(rec.mirror().len(), 1);
    }

    #[test]
    fn test_status_and_urgency_in_one_update() {
        let mut rec = OrderReconciler::new();
        let mut o = order("a");
        rec.seed(vec![o.clone()]);

        o.status = OrderStatus::Cooking;
        o.urgent = true;
        o.urgent_count = 1;
        let changes = rec.apply(Change::Updated(o.clone()));
        assert_eq!(changes.len(), 2);
        assert!(matches!(
            changes[0],
            OrderChange::StatusChanged {
                from: OrderStatus::Pending,
                to: OrderStatus::Cooking,
                ..
            }
        ));
        assert!(matches!(
            changes[1],
            OrderChange::UrgencyEscalated { previous_count: 0, .. }
        ));
    }

    #[test]
    fn test_batch_is_not_coalesced() {
        let mut rec = OrderReconciler::new();
        let mut o = order("a");
        rec.seed(vec![o.clone()]);

        o.urgent = true;
        o.urgent_count = 1;
        let first = raw(ChangeKind::Updated, &o);
        o.urgent_count = 2;
        let second = raw(ChangeKind::Updated, &o);

        let changes = rec.apply_batch(&[first, second]);
        let counts: Vec<u32> = changes
            .iter()
            .filter_map(|c| match c {
                OrderChange::UrgencyEscalated { previous_count, .. } => Some(*previous_count),
                _ => None,
            })
            .collect();
        assert_eq!(counts, vec![0, 1]);
    }

    #[test]
    fn test_unchanged_update_is_silent() {
        let mut rec = OrderReconciler::new();
        let mut o = order("a");
        o.urgent = true;
        o.urgent_count = 3;
        rec.seed(vec![o.clone()]);
        o.updated_at = Some(9_999);
        assert!(rec.apply(Change::Updated(o)).is_empty());
    }

    #[test]
    fn test_delete_and_malformed() {
        let mut rec = OrderReconciler::new();
        rec.seed(vec![order("a")]);

        let missing_id = RawChange::new(ChangeKind::Updated, EntityKind::Order, json!({"status": "cooking"}));
        assert!(rec.apply_raw(&missing_id).is_empty());
        assert_eq!(rec.mirror().len(), 1);

        let delete = RawChange::new(ChangeKind::Deleted, EntityKind::Order, json!({"id": "a"}));
        assert!(rec.apply_raw(&delete).is_empty());
        assert!(rec.mirror().is_empty());

        // Unknown id delete is a no-op
        assert!(rec.apply_raw(&delete).is_empty());
    }

    #[test]
    fn test_missing_created_at_is_retained() {
        let mut rec = OrderReconciler::new();
        let mut o = order("legacy");
        o.created_at = None;
        let changes = rec.apply_raw(&raw(ChangeKind::Inserted, &o));
        assert_eq!(changes.len(), 1);
        assert!(rec.get("legacy").unwrap().created_at.is_none());
    }

    #[test]
    fn test_replay_of_listed_history_is_silent() {
        let mut rec = OrderReconciler::new();
        let pending = order("a");
        let mut cooking = pending.clone();
        cooking.status = OrderStatus::Cooking;
        cooking.updated_at = Some(2_000);
        rec.seed(vec![cooking.clone()]);

        let mut hurried = pending.clone();
        hurried.urgent = true;
        hurried.urgent_count = 1;
        hurried.updated_at = Some(1_500);

        let replay = [
            raw(ChangeKind::Inserted, &pending),
            raw(ChangeKind::Updated, &hurried),
            raw(ChangeKind::Updated, &cooking),
        ];
        assert!(rec.apply_batch(&replay).is_empty());
        assert_eq!(rec.get("a"), Some(&cooking));
    }
}

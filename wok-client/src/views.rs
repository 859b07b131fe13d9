//! Order listings derived from the mirror
//!
//! Pure functions over a snapshot; nothing here touches the store.

use shared::BusinessZone;
use shared::models::{Order, Role};
use shared::order::OrderStatus;
use shared::time::date_key;
use std::cmp::Reverse;
use std::collections::BTreeSet;

fn day_of(order: &Order, zone: &BusinessZone) -> Option<String> {
    order.created_at.and_then(|ts| date_key(ts, zone))
}

/// Newest first; rows without a creation time sort last
fn newest_first(a: &&Order, b: &&Order) -> std::cmp::Ordering {
    Reverse(a.created_at).cmp(&Reverse(b.created_at))
}

fn queue_rank(status: OrderStatus) -> u8 {
    match status {
        OrderStatus::Pending => 0,
        OrderStatus::Cooking => 1,
        OrderStatus::Completed => 2,
        OrderStatus::Rejected => 3,
        OrderStatus::Cancelled | OrderStatus::Deleted => 4,
    }
}

/// Orders shown in normal listings (no cancelled, no trash), newest first
pub fn listed(orders: &[Order]) -> Vec<&Order> {
    let mut listed: Vec<&Order> = orders.iter().filter(|o| o.status.is_listed()).collect();
    listed.sort_by(newest_first);
    listed
}

/// Kitchen work queue: pending, cooking, completed, rejected; newest first within a status
pub fn kitchen_queue(orders: &[Order]) -> Vec<&Order> {
    let mut queue = listed(orders);
    queue.sort_by(|a, b| queue_rank(a.status).cmp(&queue_rank(b.status)).then_with(|| newest_first(a, b)));
    queue
}

/// Listing filter; `None` means "all"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// `YYYYMMDD` in the business zone
    pub day_key: Option<String>,
}

impl OrderFilter {
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn day(mut self, day_key: impl Into<String>) -> Self {
        self.day_key = Some(day_key.into());
        self
    }

    pub fn matches(&self, order: &Order, zone: &BusinessZone) -> bool {
        if let Some(status) = self.status
            && order.status != status
        {
            return false;
        }
        match &self.day_key {
            Some(day) => day_of(order, zone).as_deref() == Some(day.as_str()),
            None => true,
        }
    }
}

/// Kitchen queue narrowed by `filter`
pub fn filtered<'a>(orders: &'a [Order], filter: &OrderFilter, zone: &BusinessZone) -> Vec<&'a Order> {
    kitchen_queue(orders)
        .into_iter()
        .filter(|o| filter.matches(o, zone))
        .collect()
}

/// Day keys that have orders, newest day first
///
/// The kitchen does not count rejected orders; customers do.
pub fn day_keys(orders: &[Order], zone: &BusinessZone, role: Role) -> Vec<String> {
    let days: BTreeSet<String> = orders
        .iter()
        .filter(|o| o.status.is_listed())
        .filter(|o| role == Role::Requester || o.status != OrderStatus::Rejected)
        .filter_map(|o| day_of(o, zone))
        .collect();
    days.into_iter().rev().collect()
}

/// Per-status counters for the kitchen header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Every listed order except rejected ones
    pub all: usize,
    pub pending: usize,
    pub cooking: usize,
    pub completed: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn compute<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let mut counts = Self::default();
        for order in orders {
            match order.status {
                OrderStatus::Pending => counts.pending += 1,
                OrderStatus::Cooking => counts.cooking += 1,
                OrderStatus::Completed => counts.completed += 1,
                OrderStatus::Rejected => counts.rejected += 1,
                OrderStatus::Cancelled | OrderStatus::Deleted => continue,
            }
            if order.status != OrderStatus::Rejected {
                counts.all += 1;
            }
        }
        counts
    }

    pub fn get(&self, status: Option<OrderStatus>) -> usize {
        match status {
            None => self.all,
            Some(OrderStatus::Pending) => self.pending,
            Some(OrderStatus::Cooking) => self.cooking,
            Some(OrderStatus::Completed) => self.completed,
            Some(OrderStatus::Rejected) => self.rejected,
            Some(_) => 0,
        }
    }
}

/// Trashed orders, newest first
pub fn trash(orders: &[Order]) -> Vec<&Order> {
    let mut deleted: Vec<&Order> = orders.iter().filter(|o| o.status == OrderStatus::Deleted).collect();
    deleted.sort_by(newest_first);
    deleted
}

/// The owner's latest order still in progress
pub fn active_order<'a>(orders: &'a [Order], owner_id: &str) -> Option<&'a Order> {
    orders
        .iter()
        .filter(|o| o.owner_id == owner_id && !o.status.is_terminal())
        .min_by(newest_first)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400_000;

    fn order(id: &str, owner: &str, status: OrderStatus, created_at: i64) -> Order {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "owner_id": owner,
            "status": status,
            "created_at": created_at,
        }))
        .unwrap()
    }

    fn utc() -> BusinessZone {
        BusinessZone::utc_plus(0).unwrap()
    }

    fn sample() -> Vec<Order> {
        vec![
            order("done-old", "a", OrderStatus::Completed, 1_000),
            order("pending-old", "a", OrderStatus::Pending, 2_000),
            order("cooking", "b", OrderStatus::Cooking, 3_000),
            order("rejected", "b", OrderStatus::Rejected, DAY + 1_000),
            order("pending-new", "b", OrderStatus::Pending, DAY + 2_000),
            order("cancelled", "a", OrderStatus::Cancelled, DAY + 3_000),
            order("trash-old", "a", OrderStatus::Deleted, 500),
            order("trash-new", "a", OrderStatus::Deleted, DAY + 4_000),
        ]
    }

    fn ids(orders: Vec<&Order>) -> Vec<&str> {
        orders.into_iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn test_listed_excludes_cancelled_and_trash() {
        let orders = sample();
        assert_eq!(
            ids(listed(&orders)),
            vec!["pending-new", "rejected", "cooking", "pending-old", "done-old"]
        );
    }

    #[test]
    fn test_kitchen_queue_order() {
        let orders = sample();
        assert_eq!(
            ids(kitchen_queue(&orders)),
            vec!["pending-new", "pending-old", "cooking", "done-old", "rejected"]
        );
    }

    #[test]
    fn test_filter_by_status_and_day() {
        let orders = sample();
        let zone = utc();
        let filter = OrderFilter::default().status(OrderStatus::Pending);
        assert_eq!(ids(filtered(&orders, &filter, &zone)), vec!["pending-new", "pending-old"]);

        let filter = OrderFilter::default().day("19700101");
        assert_eq!(
            ids(filtered(&orders, &filter, &zone)),
            vec!["pending-old", "cooking", "done-old"]
        );

        let filter = OrderFilter::default().status(OrderStatus::Pending).day("19700102");
        assert_eq!(ids(filtered(&orders, &filter, &zone)), vec!["pending-new"]);
    }

    #[test]
    fn test_day_keys_descending() {
        let mut orders = sample();
        let zone = utc();
        assert_eq!(day_keys(&orders, &zone, Role::Fulfiller), vec!["19700102", "19700101"]);

        orders.push(order("rejected-only", "b", OrderStatus::Rejected, 2 * DAY + 1));
        assert_eq!(
            day_keys(&orders, &zone, Role::Requester),
            vec!["19700103", "19700102", "19700101"]
        );
        assert_eq!(day_keys(&orders, &zone, Role::Fulfiller).len(), 2);
    }

    #[test]
    fn test_status_counts() {
        let orders = sample();
        let counts = StatusCounts::compute(&orders);
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.cooking, 1);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.rejected, 1);
        assert_eq!(counts.all, 4);
        assert_eq!(counts.get(None), 4);
        assert_eq!(counts.get(Some(OrderStatus::Cancelled)), 0);
    }

    #[test]
    fn test_trash_newest_first() {
        let orders = sample();
        assert_eq!(ids(trash(&orders)), vec!["trash-new", "trash-old"]);
    }

    #[test]
    fn test_active_order() {
        let orders = sample();
        assert_eq!(active_order(&orders, "a").map(|o| o.id.as_str()), Some("pending-old"));
        assert_eq!(active_order(&orders, "b").map(|o| o.id.as_str()), Some("pending-new"));
        assert!(active_order(&orders, "nobody").is_none());
    }

    #[test]
    fn test_missing_created_at_sorts_last() {
        let mut orders = sample();
        let mut legacy = order("legacy", "c", OrderStatus::Pending, 0);
        legacy.created_at = None;
        orders.push(legacy);
        let queue = ids(kitchen_queue(&orders));
        assert_eq!(&queue[..3], &["pending-new", "pending-old", "legacy"]);
        assert!(day_keys(&orders, &utc(), Role::Fulfiller).iter().all(|d| d.starts_with("1970")));
    }
}

//! Order Model

use super::menu_item::{Category, MenuItem};
use crate::order::OrderStatus;
use serde::{Deserialize, Serialize};

/// Sentinel special request meaning "nothing special"
pub const NO_SPECIAL_REQUEST: &str = "none";

fn default_special_request() -> String {
    NO_SPECIAL_REQUEST.to_string()
}

/// Quick option toggles shown next to each dish
///
/// The three switches are reused for beverages with a different meaning,
/// see [`QuickOptions::labels`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct QuickOptions {
    #[serde(default)]
    pub spicy: bool,
    #[serde(default)]
    pub cilantro: bool,
    #[serde(default)]
    pub scallion: bool,
}

impl QuickOptions {
    pub fn is_empty(&self) -> bool {
        !(self.spicy || self.cilantro || self.scallion)
    }

    /// Labels of the enabled toggles, in display order
    pub fn labels(&self, category: Option<Category>) -> Vec<&'static str> {
        let names: [&'static str; 3] = match category {
            Some(Category::Beverage) => ["iced", "hot", "room temperature"],
            _ => ["extra spicy", "cilantro", "scallion"],
        };
        [self.spicy, self.cilantro, self.scallion]
            .into_iter()
            .zip(names)
            .filter_map(|(on, name)| on.then_some(name))
            .collect()
    }
}

/// Order line item: a snapshot of a menu item at order time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineItem {
    /// Menu item reference
    pub id: String,
    pub name: String,
    /// Unit price at order time
    pub price: i64,
    pub quantity: u32,
    #[serde(default = "default_special_request")]
    pub special_request: String,
    #[serde(default)]
    pub quick_options: QuickOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl OrderLineItem {
    /// Snapshot a menu item with no annotations
    pub fn from_menu_item(item: &MenuItem, quantity: u32) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity,
            special_request: default_special_request(),
            quick_options: QuickOptions::default(),
            category: Some(item.category),
            image: Some(item.image.clone()),
        }
    }

    pub fn subtotal(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }

    pub fn has_special_request(&self) -> bool {
        !self.special_request.is_empty() && self.special_request != NO_SPECIAL_REQUEST
    }
}

/// Σ price × quantity
pub fn compute_total(items: &[OrderLineItem]) -> i64 {
    items.iter().map(OrderLineItem::subtotal).sum()
}

/// Order record as held by the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Order ID (assigned by store)
    pub id: String,
    /// Requester's opaque client id
    #[serde(alias = "user_id")]
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderLineItem>,
    #[serde(default)]
    pub total_price: i64,
    pub status: OrderStatus,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub urgent_count: u32,
    /// Assigned once by the store; may be missing on legacy rows
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub cooking_started_at: Option<i64>,
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl Order {
    /// Apply a partial update in place
    pub fn apply_patch(&mut self, patch: &OrderPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(items) = &patch.items {
            self.items = items.clone();
        }
        if let Some(total) = patch.total_price {
            self.total_price = total;
        }
        if let Some(urgent) = patch.urgent {
            self.urgent = urgent;
        }
        if let Some(count) = patch.urgent_count {
            self.urgent_count = count;
        }
        // Lifecycle stamps are set once
        if self.cooking_started_at.is_none() {
            self.cooking_started_at = patch.cooking_started_at;
        }
        if self.completed_at.is_none() {
            self.completed_at = patch.completed_at;
        }
        if let Some(ts) = patch.updated_at {
            self.updated_at = Some(ts);
        }
    }

    /// Name of the first line item, used as the notification headline
    pub fn first_item_name(&self) -> Option<&str> {
        self.items.first().map(|line| line.name.as_str())
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    pub fn is_total_consistent(&self) -> bool {
        self.total_price == compute_total(&self.items)
    }
}

/// Submission payload produced by the cart
///
/// Status, urgency and timestamps are fixed: a draft always enters the
/// store as a fresh `pending` order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDraft {
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub items: Vec<OrderLineItem>,
    pub total_price: i64,
    pub status: OrderStatus,
    pub urgent: bool,
    pub urgent_count: u32,
}

impl OrderDraft {
    pub fn new(owner_id: impl Into<String>, items: Vec<OrderLineItem>) -> Self {
        let total_price = compute_total(&items);
        Self {
            owner_id: owner_id.into(),
            customer_name: None,
            items,
            total_price,
            status: OrderStatus::Pending,
            urgent: false,
            urgent_count: 0,
        }
    }

    pub fn with_customer_name(mut self, name: Option<String>) -> Self {
        self.customer_name = name;
        self
    }

    /// Materialize into a stored order
    pub fn into_order(self, id: String, created_at: i64) -> Order {
        Order {
            id,
            owner_id: self.owner_id,
            customer_name: self.customer_name,
            items: self.items,
            total_price: self.total_price,
            status: self.status,
            urgent: self.urgent,
            urgent_count: self.urgent_count,
            created_at: Some(created_at),
            cooking_started_at: None,
            completed_at: None,
            updated_at: Some(created_at),
        }
    }
}

/// Partial order update
///
/// Only the fields the lifecycle planner touches are patchable; identity,
/// owner and creation time never change after insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OrderPatch {
    /// Precondition, not a column: the store refuses the patch unless the
    /// row still has this status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderLineItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgent_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooking_started_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

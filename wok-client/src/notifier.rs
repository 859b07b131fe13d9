//! Notification decisions
//!
//! Maps classified order changes plus the recipient context to dispatch
//! intents. Pure: no I/O, no dedup state. Novelty comes solely from the
//! reconciler's diff.

use crate::reconciler::OrderChange;
use shared::models::{Order, Role};
use shared::order::OrderStatus;

/// Fallback headline when an order has no items
const GENERIC_DISH: &str = "a dish";

/// Who the notifier is running for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyContext {
    pub client_id: String,
    pub role: Role,
}

impl NotifyContext {
    pub fn new(client_id: impl Into<String>, role: Role) -> Self {
        Self {
            client_id: client_id.into(),
            role,
        }
    }
}

/// Intended audience of an intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchTarget {
    /// Every fulfiller
    Fulfiller,
    /// Only the requester who owns the order
    Requester { owner_id: String },
}

impl DispatchTarget {
    pub fn role(&self) -> Role {
        match self {
            Self::Fulfiller => Role::Fulfiller,
            Self::Requester { .. } => Role::Requester,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    NewOrder,
    StatusUpdate,
    BackToPending,
    Cancelled,
    Urgent,
}

/// One notification to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchIntent {
    pub kind: IntentKind,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub target: DispatchTarget,
    pub order_id: String,
}

fn dish_name(order: &Order) -> &str {
    order.first_item_name().unwrap_or(GENERIC_DISH)
}

fn fulfiller_intent(kind: IntentKind, order: &Order, icon: &str, title: &str, body: String) -> DispatchIntent {
    DispatchIntent {
        kind,
        title: format!("{} {}", icon, title),
        body,
        icon: icon.to_string(),
        target: DispatchTarget::Fulfiller,
        order_id: order.id.clone(),
    }
}

/// Requester-facing wording per status
fn requester_status_message(status: OrderStatus) -> Option<(&'static str, &'static str)> {
    match status {
        OrderStatus::Cooking => Some(("👨‍🍳 Order accepted", "is being cooked")),
        OrderStatus::Completed => Some(("✅ Order ready", "is ready for pickup")),
        OrderStatus::Rejected => Some(("❌ Order rejected", "cannot be made right now, try again later")),
        OrderStatus::Cancelled => Some(("🚫 Order cancelled", "has been cancelled")),
        _ => None,
    }
}

/// Intents for one classified change
pub fn intents_for(change: &OrderChange, ctx: &NotifyContext) -> Vec<DispatchIntent> {
    let requester = Role::Requester.label();
    let fulfiller = Role::Fulfiller.label();

    match change {
        OrderChange::NewOrder(order) => {
            let who = order.customer_name.as_deref().unwrap_or(requester);
            vec![fulfiller_intent(
                IntentKind::NewOrder,
                order,
                "🍴",
                "New order",
                format!("{} just ordered {}", who, dish_name(order)),
            )]
        }
        OrderChange::StatusChanged { order, to, .. } => {
            let mut intents = Vec::new();
            let dish = dish_name(order);

            // Requester alerts stay on the owner's own client
            if order.owner_id == ctx.client_id
                && let Some((title, msg)) = requester_status_message(*to)
            {
                intents.push(DispatchIntent {
                    kind: IntentKind::StatusUpdate,
                    title: title.to_string(),
                    body: format!("{}: {} {}", fulfiller, dish, msg),
                    icon: "🔔".to_string(),
                    target: DispatchTarget::Requester {
                        owner_id: order.owner_id.clone(),
                    },
                    order_id: order.id.clone(),
                });
            }

            match to {
                OrderStatus::Pending => intents.push(fulfiller_intent(
                    IntentKind::BackToPending,
                    order,
                    "🔔",
                    "Order status changed",
                    format!("An order is back to pending: {}", dish),
                )),
                OrderStatus::Cancelled => intents.push(fulfiller_intent(
                    IntentKind::Cancelled,
                    order,
                    "❌",
                    "Order cancelled",
                    format!("{} cancelled the order: {}", requester, dish),
                )),
                _ => {}
            }
            intents
        }
        OrderChange::UrgencyEscalated { order, .. } => vec![fulfiller_intent(
            IntentKind::Urgent,
            order,
            "🔔",
            "Hurry up",
            format!("{} is waiting on: {} (x{})", requester, dish_name(order), order.urgent_count),
        )],
    }
}

/// Intents for a sequence of changes, in order
pub fn intents(changes: &[OrderChange], ctx: &NotifyContext) -> Vec<DispatchIntent> {
    changes.iter().flat_map(|c| intents_for(c, ctx)).collect()
}

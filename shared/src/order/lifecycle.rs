//! Lifecycle planning
//!
//! Every mutation is planned as an [`OrderPatch`] against the *current*
//! record. A planner either returns the complete patch or an [`OrderError`];
//! nothing is written on error. Each patch carries the status it was planned
//! against, and the store re-runs [`check_patch`] under its write lock.

use super::{OrderError, OrderStatus, can_transition};
use crate::models::{Order, OrderLineItem, OrderPatch, compute_total};

/// Plan a status transition
///
/// Entering `cooking` and `completed` stamps the matching timestamp, but only
/// if it has never been set.
pub fn plan_transition(order: &Order, to: OrderStatus, now: i64) -> Result<OrderPatch, OrderError> {
    if !can_transition(order.status, to) {
        return Err(OrderError::InvalidTransition {
            id: order.id.clone(),
            from: order.status,
            to,
        });
    }

    let mut patch = OrderPatch {
        expected_status: Some(order.status),
        status: Some(to),
        updated_at: Some(now),
        ..Default::default()
    };
    match to {
        OrderStatus::Cooking if order.cooking_started_at.is_none() => {
            patch.cooking_started_at = Some(now);
        }
        OrderStatus::Completed if order.completed_at.is_none() => {
            patch.completed_at = Some(now);
        }
        _ => {}
    }
    Ok(patch)
}

/// Plan a restore out of the trash
pub fn plan_restore(order: &Order, now: i64) -> Result<OrderPatch, OrderError> {
    if order.status != OrderStatus::Deleted {
        return Err(OrderError::NotDeleted(order.id.clone()));
    }
    plan_transition(order, OrderStatus::Pending, now)
}

/// Plan an urgency escalation ("hurry up")
///
/// Every escalation bumps the counter, so repeated hurries are distinguishable.
pub fn plan_escalation(order: &Order, now: i64) -> Result<OrderPatch, OrderError> {
    if order.status.is_terminal() {
        return Err(OrderError::NotEscalatable {
            id: order.id.clone(),
            status: order.status,
        });
    }
    Ok(OrderPatch {
        expected_status: Some(order.status),
        urgent: Some(true),
        urgent_count: Some(order.urgent_count.saturating_add(1)),
        updated_at: Some(now),
        ..Default::default()
    })
}

/// Plan an item edit
///
/// Zero-quantity lines are dropped; the total is recomputed from the
/// remaining lines in the same patch.
pub fn plan_edit(
    order: &Order,
    items: Vec<OrderLineItem>,
    now: i64,
) -> Result<OrderPatch, OrderError> {
    if !order.status.is_editable() {
        return Err(OrderError::NotEditable {
            id: order.id.clone(),
            status: order.status,
        });
    }
    let items: Vec<OrderLineItem> = items.into_iter().filter(|line| line.quantity > 0).collect();
    if items.is_empty() {
        return Err(OrderError::EmptyOrder);
    }
    Ok(OrderPatch {
        expected_status: Some(order.status),
        total_price: Some(compute_total(&items)),
        items: Some(items),
        updated_at: Some(now),
        ..Default::default()
    })
}

/// Verify a patch still applies to `order`
///
/// Fails when the row left the status the patch was planned against, or when
/// the patch would move the row along an edge the state machine forbids.
pub fn check_patch(order: &Order, patch: &OrderPatch) -> Result<(), OrderError> {
    if let Some(expected) = patch.expected_status
        && expected != order.status
    {
        return Err(OrderError::StatusChanged {
            id: order.id.clone(),
            expected,
            actual: order.status,
        });
    }
    if let Some(to) = patch.status
        && to != order.status
        && !can_transition(order.status, to)
    {
        return Err(OrderError::InvalidTransition {
            id: order.id.clone(),
            from: order.status,
            to,
        });
    }
    Ok(())
}

/// Change a line's quantity by `delta`, removing the line when it reaches zero
pub fn adjust_line_quantity(
    items: &mut Vec<OrderLineItem>,
    index: usize,
    delta: i32,
) -> Result<(), OrderError> {
    let line = items.get_mut(index).ok_or(OrderError::LineNotFound(index))?;
    let next = i64::from(line.quantity) + i64::from(delta);
    if next <= 0 {
        items.remove(index);
    } else {
        line.quantity = u32::try_from(next).map_err(|_| OrderError::InvalidQuantity)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NO_SPECIAL_REQUEST, OrderDraft, QuickOptions};

    fn line(name: &str, price: i64, quantity: u32) -> OrderLineItem {
        OrderLineItem {
            id: format!("m-{}", name),
            name: name.to_string(),
            price,
            quantity,
            special_request: NO_SPECIAL_REQUEST.to_string(),
            quick_options: QuickOptions::default(),
            category: None,
            image: None,
        }
    }

    fn pending_order() -> Order {
        OrderDraft::new("client-1", vec![line("麻婆豆腐", 19, 2), line("米饭", 2, 1)])
            .into_order("o-1".to_string(), 1_000)
    }

    fn apply(order: &mut Order, patch: OrderPatch) {
        order.apply_patch(&patch);
    }

    #[test]
    fn test_cooking_stamps_once() {
        let mut order = pending_order();
        let patch = plan_transition(&order, OrderStatus::Cooking, 2_000).unwrap();
        assert_eq!(patch.cooking_started_at, Some(2_000));
        apply(&mut order, patch);

        // Trash and restore, then cook again: the first stamp stays
        let patch = plan_transition(&order, OrderStatus::Deleted, 3_000).unwrap();
        apply(&mut order, patch);
        let patch = plan_restore(&order, 4_000).unwrap();
        apply(&mut order, patch);
        let patch = plan_transition(&order, OrderStatus::Cooking, 5_000).unwrap();
        assert!(patch.cooking_started_at.is_none());
        apply(&mut order, patch);
        assert_eq!(order.cooking_started_at, Some(2_000));
    }

    #[test]
    fn test_completed_stamps() {
        let mut order = pending_order();
        let patch = plan_transition(&order, OrderStatus::Cooking, 2_000).unwrap();
        apply(&mut order, patch);
        let patch = plan_transition(&order, OrderStatus::Completed, 3_000).unwrap();
        assert_eq!(patch.completed_at, Some(3_000));
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let mut order = pending_order();
        order.status = OrderStatus::Completed;
        let err = plan_transition(&order, OrderStatus::Cooking, 2_000).unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition {
                id: "o-1".to_string(),
                from: OrderStatus::Completed,
                to: OrderStatus::Cooking,
            }
        );
    }

    #[test]
    fn test_restore_requires_deleted() {
        let order = pending_order();
        assert_eq!(
            plan_restore(&order, 2_000).unwrap_err(),
            OrderError::NotDeleted("o-1".to_string())
        );
    }

    #[test]
    fn test_escalation_increments_every_time() {
        let mut order = pending_order();
        let patch = plan_escalation(&order, 2_000).unwrap();
        apply(&mut order, patch);
        let patch = plan_escalation(&order, 3_000).unwrap();
        apply(&mut order, patch);
        assert!(order.urgent);
        assert_eq!(order.urgent_count, 2);

        order.status = OrderStatus::Completed;
        assert!(matches!(
            plan_escalation(&order, 4_000),
            Err(OrderError::NotEscalatable { .. })
        ));
    }

    #[test]
    fn test_edit_recomputes_total_and_drops_zero_lines() {
        let mut order = pending_order();
        let mut items = order.items.clone();
        items[0].quantity = 0;
        items[1].quantity = 3;
        let patch = plan_edit(&order, items, 2_000).unwrap();
        apply(&mut order, patch);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total_price, 6);
        assert!(order.is_total_consistent());
    }

    #[test]
    fn test_edit_refuses_empty_and_non_pending() {
        let order = pending_order();
        assert_eq!(plan_edit(&order, vec![], 2_000).unwrap_err(), OrderError::EmptyOrder);

        let mut cooking = pending_order();
        cooking.status = OrderStatus::Cooking;
        assert!(matches!(
            plan_edit(&cooking, cooking.items.clone(), 2_000),
            Err(OrderError::NotEditable { .. })
        ));
    }

    #[test]
    fn test_adjust_line_quantity() {
        let mut items = vec![line("a", 10, 1), line("b", 5, 2)];
        adjust_line_quantity(&mut items, 1, 2).unwrap();
        assert_eq!(items[1].quantity, 4);

        adjust_line_quantity(&mut items, 0, -1).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "b");

        assert_eq!(
            adjust_line_quantity(&mut items, 5, 1).unwrap_err(),
            OrderError::LineNotFound(5)
        );
    }

    #[test]
    fn test_check_patch_detects_stale_plan() {
        let order = pending_order();
        let patch = plan_transition(&order, OrderStatus::Cooking, 2_000).unwrap();
        assert_eq!(patch.expected_status, Some(OrderStatus::Pending));
        assert!(check_patch(&order, &patch).is_ok());

        let mut cancelled = pending_order();
        cancelled.status = OrderStatus::Cancelled;
        assert_eq!(
            check_patch(&cancelled, &patch).unwrap_err(),
            OrderError::StatusChanged {
                id: "o-1".to_string(),
                expected: OrderStatus::Pending,
                actual: OrderStatus::Cancelled,
            }
        );
    }

    #[test]
    fn test_check_patch_enforces_state_machine() {
        let mut order = pending_order();
        order.status = OrderStatus::Completed;
        let patch = OrderPatch {
            status: Some(OrderStatus::Pending),
            ..Default::default()
        };
        assert!(matches!(
            check_patch(&order, &patch),
            Err(OrderError::InvalidTransition { .. })
        ));

        // Patches without a status only need the precondition
        let hurry = OrderPatch {
            urgent: Some(true),
            ..Default::default()
        };
        assert!(check_patch(&order, &hurry).is_ok());
    }
}

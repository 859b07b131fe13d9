//! Order lifecycle service
//!
//! Every mutation re-reads the store's current record, plans the patch with
//! the lifecycle guards and only then writes. The store re-checks the plan
//! atomically with the write, so a record that moved in between is refused
//! the same way. A refused guard leaves the record untouched.

use crate::cart::Cart;
use crate::config::ClientContext;
use crate::error::ClientResult;
use crate::store::{MenuStore, OrderStore, StoreError};
use shared::models::{MenuItemPatch, Order, OrderLineItem, OrderPatch};
use shared::order::{self, OrderError, OrderStatus};
use shared::util::now_millis;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Clock used for lifecycle stamps
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// A catalog counter that could not be bumped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesFailure {
    pub menu_item_id: String,
    pub quantity: u32,
    pub error: StoreError,
}

/// Result of completing an order
///
/// The status transition is committed even when some sales counters fail.
#[derive(Debug, Clone)]
pub struct CompletionReport {
    pub order: Order,
    pub sales_updated: Vec<String>,
    pub sales_failures: Vec<SalesFailure>,
}

impl CompletionReport {
    pub fn is_clean(&self) -> bool {
        self.sales_failures.is_empty()
    }
}

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    menu: Arc<dyn MenuStore>,
    clock: Clock,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService")
            .field("orders", &"<OrderStore>")
            .field("menu", &"<MenuStore>")
            .finish()
    }
}

impl OrderService {
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: OrderStore + MenuStore + 'static,
    {
        Self {
            orders: store.clone(),
            menu: store,
            clock: Arc::new(now_millis),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> i64 {
        (self.clock)()
    }

    /// Submit the cart as a new pending order; the cart is cleared on success
    #[instrument(skip(self, cart, ctx), fields(client_id = %ctx.client_id))]
    pub async fn submit(&self, cart: &mut Cart, ctx: &ClientContext) -> ClientResult<Order> {
        let draft = cart.to_draft(&ctx.client_id, ctx.customer_name.clone())?;
        let order = self.orders.insert_order(draft).await?;
        cart.clear();
        info!(order_id = %order.id, total = order.total_price, "Order submitted");
        Ok(order)
    }

    async fn write(&self, id: &str, patch: OrderPatch) -> ClientResult<Order> {
        match self.orders.update_order(id, patch).await {
            Ok(order) => Ok(order),
            Err(StoreError::Rejected(e)) => {
                warn!(order_id = %id, error = %e, "Write refused by store");
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Guarded status transition against the current record
    pub async fn transition(&self, id: &str, to: OrderStatus) -> ClientResult<Order> {
        let current = self.orders.get_order(id).await?;
        let patch = order::plan_transition(&current, to, self.now()).inspect_err(|e| {
            warn!(order_id = %id, error = %e, "Transition refused");
        })?;
        let updated = self.write(id, patch).await?;
        info!(order_id = %id, from = %current.status, to = %to, "Order status changed");
        Ok(updated)
    }

    pub async fn start_cooking(&self, id: &str) -> ClientResult<Order> {
        self.transition(id, OrderStatus::Cooking).await
    }

    pub async fn reject(&self, id: &str) -> ClientResult<Order> {
        self.transition(id, OrderStatus::Rejected).await
    }

    pub async fn cancel(&self, id: &str) -> ClientResult<Order> {
        self.transition(id, OrderStatus::Cancelled).await
    }

    /// Move to the trash
    pub async fn soft_delete(&self, id: &str) -> ClientResult<Order> {
        self.transition(id, OrderStatus::Deleted).await
    }

    /// Bring a trashed order back to pending
    pub async fn restore(&self, id: &str) -> ClientResult<Order> {
        let current = self.orders.get_order(id).await?;
        let patch = order::plan_restore(&current, self.now())?;
        let updated = self.write(id, patch).await?;
        info!(order_id = %id, "Order restored");
        Ok(updated)
    }

    /// Complete the order, then bump each line's sales counter
    ///
    /// Counters are updated one by one; a failed counter is reported and
    /// logged but neither rolls back the completion nor stops the others.
    #[instrument(skip(self))]
    pub async fn complete(&self, id: &str) -> ClientResult<CompletionReport> {
        let order = self.transition(id, OrderStatus::Completed).await?;

        let mut sales_updated = Vec::new();
        let mut sales_failures = Vec::new();
        for line in &order.items {
            match self.bump_sales(line).await {
                Ok(()) => sales_updated.push(line.id.clone()),
                Err(error) => {
                    warn!(menu_item_id = %line.id, error = %error, "Sales counter update failed");
                    sales_failures.push(SalesFailure {
                        menu_item_id: line.id.clone(),
                        quantity: line.quantity,
                        error,
                    });
                }
            }
        }

        Ok(CompletionReport {
            order,
            sales_updated,
            sales_failures,
        })
    }

    async fn bump_sales(&self, line: &OrderLineItem) -> Result<(), StoreError> {
        let item = self.menu.get_menu_item(&line.id).await?;
        let patch = MenuItemPatch {
            sales: Some(item.sales.saturating_add(u64::from(line.quantity))),
            ..Default::default()
        };
        self.menu.update_menu_item(&line.id, patch).await?;
        Ok(())
    }

    /// Hurry the kitchen
    pub async fn escalate(&self, id: &str) -> ClientResult<Order> {
        let current = self.orders.get_order(id).await?;
        let patch = order::plan_escalation(&current, self.now())?;
        let updated = self.write(id, patch).await?;
        info!(order_id = %id, urgent_count = updated.urgent_count, "Order hurried");
        Ok(updated)
    }

    /// Replace the items of a pending order; total is recomputed
    pub async fn edit_items(&self, id: &str, items: Vec<OrderLineItem>) -> ClientResult<Order> {
        let current = self.orders.get_order(id).await?;
        let patch = order::plan_edit(&current, items, self.now())?;
        self.write(id, patch).await
    }

    /// Change one line's quantity by `delta`; the line is dropped at zero
    pub async fn adjust_line(&self, id: &str, index: usize, delta: i32) -> ClientResult<Order> {
        let current = self.orders.get_order(id).await?;
        let mut items = current.items.clone();
        order::adjust_line_quantity(&mut items, index, delta)?;
        let patch = order::plan_edit(&current, items, self.now())?;
        self.write(id, patch).await
    }

    /// Permanently remove a trashed order
    pub async fn purge(&self, id: &str) -> ClientResult<()> {
        let current = self.orders.get_order(id).await?;
        if current.status != OrderStatus::Deleted {
            return Err(OrderError::NotDeleted(id.to_string()).into());
        }
        self.orders.delete_order(id).await?;
        info!(order_id = %id, "Order purged");
        Ok(())
    }

    /// Purge every trashed order; returns how many were removed
    pub async fn empty_trash(&self) -> ClientResult<usize> {
        let trashed: Vec<String> = self
            .orders
            .list_orders()
            .await?
            .into_iter()
            .filter(|o| o.status == OrderStatus::Deleted)
            .map(|o| o.id)
            .collect();
        for id in &trashed {
            self.orders.delete_order(id).await?;
        }
        info!(count = trashed.len(), "Trash emptied");
        Ok(trashed.len())
    }
}

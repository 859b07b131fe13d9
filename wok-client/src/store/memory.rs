//! In-memory reference store
//!
//! Holds both tables behind `parking_lot` locks and publishes every committed
//! write on a per-table broadcast feed while the write lock is still held, so
//! feed order always matches commit order. Ids are
//! UUIDv4, timestamps come from an optionally pinned clock so tests can place
//! orders on specific days.

use super::{MenuStore, OrderStore, StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;
use shared::feed::{ChangeKind, EntityKind, RawChange};
use shared::models::{MenuItem, MenuItemCreate, MenuItemPatch, Order, OrderDraft, OrderPatch};
use shared::order::check_patch;
use shared::util::now_millis;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::broadcast;

/// Feed channel capacity
const FEED_CHANNEL_CAPACITY: usize = 1024;

pub struct MemoryStore {
    orders: RwLock<BTreeMap<String, Order>>,
    menu: RwLock<BTreeMap<String, MenuItem>>,
    order_tx: broadcast::Sender<RawChange>,
    menu_tx: broadcast::Sender<RawChange>,
    /// Pinned clock in millis, 0 = wall clock
    clock: AtomicI64,
    offline: AtomicBool,
    failing_menu_items: RwLock<HashSet<String>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("orders", &self.orders.read().len())
            .field("menu", &self.menu.read().len())
            .field("clock", &self.clock.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(FEED_CHANNEL_CAPACITY)
    }

    /// Create a store whose feeds buffer at most `capacity` events per subscriber
    pub fn with_capacity(capacity: usize) -> Self {
        let (order_tx, _) = broadcast::channel(capacity);
        let (menu_tx, _) = broadcast::channel(capacity);
        Self {
            orders: RwLock::new(BTreeMap::new()),
            menu: RwLock::new(BTreeMap::new()),
            order_tx,
            menu_tx,
            clock: AtomicI64::new(0),
            offline: AtomicBool::new(false),
            failing_menu_items: RwLock::new(HashSet::new()),
        }
    }

    // ========== Test controls ==========

    /// Pin the store clock
    pub fn set_clock(&self, millis: i64) {
        self.clock.store(millis, Ordering::SeqCst);
    }

    /// Advance a pinned clock
    pub fn advance_clock(&self, millis: i64) {
        self.clock.fetch_add(millis, Ordering::SeqCst);
    }

    /// Current store time
    pub fn now(&self) -> i64 {
        match self.clock.load(Ordering::SeqCst) {
            0 => now_millis(),
            pinned => pinned,
        }
    }

    /// Simulate a lost connection: every call fails with a transport error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make updates to one menu item fail
    pub fn fail_menu_updates_for(&self, id: impl Into<String>) {
        self.failing_menu_items.write().insert(id.into());
    }

    /// Publish an arbitrary event on the order feed (malformed rows, replays)
    pub fn publish_raw_order_change(&self, change: RawChange) {
        let _ = self.order_tx.send(change);
    }

    // ========== Internals ==========

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("store unreachable".to_string()));
        }
        Ok(())
    }

    fn publish<T: Serialize>(
        tx: &broadcast::Sender<RawChange>,
        kind: ChangeKind,
        entity: EntityKind,
        record: &T,
    ) -> StoreResult<()> {
        let record = serde_json::to_value(record)
            .map_err(|e| StoreError::Transport(format!("encode {}: {}", entity.as_str(), e)))?;
        // No subscribers is fine
        let _ = tx.send(RawChange::new(kind, entity, record));
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        self.check_online()?;
        Ok(self.orders.read().values().cloned().collect())
    }

    async fn get_order(&self, id: &str) -> StoreResult<Order> {
        self.check_online()?;
        self.orders
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::order_not_found(id))
    }

    async fn insert_order(&self, draft: OrderDraft) -> StoreResult<Order> {
        self.check_online()?;
        if draft.items.is_empty() {
            return Err(StoreError::Constraint("order must have at least one item".to_string()));
        }
        let id = uuid::Uuid::new_v4().to_string();
        let order = draft.into_order(id.clone(), self.now());
        let mut orders = self.orders.write();
        orders.insert(id, order.clone());

        tracing::debug!(order_id = %order.id, "Order inserted");
        Self::publish(&self.order_tx, ChangeKind::Inserted, EntityKind::Order, &order)?;
        Ok(order)
    }

    async fn update_order(&self, id: &str, patch: OrderPatch) -> StoreResult<Order> {
        self.check_online()?;
        let mut orders = self.orders.write();
        let order = orders
            .get_mut(id)
            .ok_or_else(|| StoreError::order_not_found(id))?;
        check_patch(order, &patch).map_err(StoreError::Rejected)?;
        order.apply_patch(&patch);

        tracing::debug!(order_id = %id, status = %order.status, "Order updated");
        Self::publish(&self.order_tx, ChangeKind::Updated, EntityKind::Order, &*order)?;
        Ok(order.clone())
    }

    async fn delete_order(&self, id: &str) -> StoreResult<()> {
        self.check_online()?;
        let mut orders = self.orders.write();
        if orders.remove(id).is_none() {
            return Err(StoreError::order_not_found(id));
        }

        tracing::debug!(order_id = %id, "Order removed");
        Self::publish(
            &self.order_tx,
            ChangeKind::Deleted,
            EntityKind::Order,
            &json!({ "id": id }),
        )
    }

    fn subscribe_orders(&self) -> broadcast::Receiver<RawChange> {
        self.order_tx.subscribe()
    }
}

#[async_trait]
impl MenuStore for MemoryStore {
    async fn list_menu_items(&self) -> StoreResult<Vec<MenuItem>> {
        self.check_online()?;
        Ok(self.menu.read().values().cloned().collect())
    }

    async fn get_menu_item(&self, id: &str) -> StoreResult<MenuItem> {
        self.check_online()?;
        self.menu
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::menu_item_not_found(id))
    }

    async fn insert_menu_item(&self, item: MenuItemCreate) -> StoreResult<MenuItem> {
        self.check_online()?;
        if item.price < 0 {
            return Err(StoreError::Constraint(format!("negative price for {}", item.name)));
        }
        let mut menu = self.menu.write();
        let id = item
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        if menu.contains_key(&id) {
            return Err(StoreError::Constraint(format!("duplicate menu item id {}", id)));
        }
        let item = item.into_item(id.clone());
        menu.insert(id, item.clone());

        Self::publish(&self.menu_tx, ChangeKind::Inserted, EntityKind::MenuItem, &item)?;
        Ok(item)
    }

    async fn update_menu_item(&self, id: &str, patch: MenuItemPatch) -> StoreResult<MenuItem> {
        self.check_online()?;
        if self.failing_menu_items.read().contains(id) {
            return Err(StoreError::Transport(format!("update of menu item {} failed", id)));
        }
        let mut menu = self.menu.write();
        let item = menu
            .get_mut(id)
            .ok_or_else(|| StoreError::menu_item_not_found(id))?;
        item.apply_patch(&patch);

        Self::publish(&self.menu_tx, ChangeKind::Updated, EntityKind::MenuItem, &*item)?;
        Ok(item.clone())
    }

    async fn delete_menu_item(&self, id: &str) -> StoreResult<()> {
        self.check_online()?;
        let mut menu = self.menu.write();
        if menu.remove(id).is_none() {
            return Err(StoreError::menu_item_not_found(id));
        }
        Self::publish(
            &self.menu_tx,
            ChangeKind::Deleted,
            EntityKind::MenuItem,
            &json!({ "id": id }),
        )
    }

    fn subscribe_menu(&self) -> broadcast::Receiver<RawChange> {
        self.menu_tx.subscribe()
    }
}

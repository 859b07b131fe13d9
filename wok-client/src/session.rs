//! Client session
//!
//! Owns this client's mirrors and drives the change feeds through
//! reconciler → notifier → dispatcher, one event at a time.

use crate::config::ClientContext;
use crate::dispatch::Dispatcher;
use crate::error::ClientResult;
use crate::notifier::{self, DispatchIntent};
use crate::reconciler::{Mirror, OrderReconciler};
use crate::store::{MenuStore, OrderStore};
use shared::feed::RawChange;
use shared::models::{MenuItem, Order};
use shared::order::DailySequences;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_util::sync::CancellationToken;

/// Which feed an event came from
enum FeedEvent {
    Shutdown,
    Order(Result<RawChange, RecvError>),
    Menu(Result<RawChange, RecvError>),
}

pub struct ClientSession {
    ctx: ClientContext,
    order_store: Arc<dyn OrderStore>,
    menu_store: Arc<dyn MenuStore>,
    orders: OrderReconciler,
    menu: Mirror<MenuItem>,
    dispatcher: Dispatcher,
    order_rx: broadcast::Receiver<RawChange>,
    menu_rx: broadcast::Receiver<RawChange>,
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("ctx", &self.ctx)
            .field("orders", &self.orders.mirror().len())
            .field("menu", &self.menu.len())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl ClientSession {
    /// Subscribe to both feeds, then seed the mirrors from full listings
    ///
    /// Subscribing first means nothing committed after the listing is lost.
    /// Events already reflected in the listing are skipped by the mirror:
    /// inserts for listed ids and updates older than the listed row.
    pub async fn bootstrap<S>(store: Arc<S>, ctx: ClientContext, dispatcher: Dispatcher) -> ClientResult<Self>
    where
        S: OrderStore + MenuStore + 'static,
    {
        let order_rx = store.subscribe_orders();
        let menu_rx = store.subscribe_menu();
        let mut session = Self {
            ctx,
            order_store: store.clone(),
            menu_store: store,
            orders: OrderReconciler::new(),
            menu: Mirror::new(),
            dispatcher,
            order_rx,
            menu_rx,
        };
        session.resync().await?;
        tracing::info!(
            client_id = %session.ctx.client_id,
            role = %session.ctx.role,
            orders = session.orders.mirror().len(),
            menu = session.menu.len(),
            "Session started"
        );
        Ok(session)
    }

    /// Replace both mirrors with fresh listings; raises no alerts
    pub async fn resync(&mut self) -> ClientResult<()> {
        let orders = self.order_store.list_orders().await?;
        let menu = self.menu_store.list_menu_items().await?;
        self.orders.seed(orders);
        self.menu.seed(menu);
        Ok(())
    }

    /// Drop whatever is buffered on the feeds and rebuild from the store
    async fn recover_from_lag(&mut self, skipped: u64) -> ClientResult<()> {
        tracing::warn!(skipped, "Change feed lagged, resyncing from store");
        self.order_rx = self.order_store.subscribe_orders();
        self.menu_rx = self.menu_store.subscribe_menu();
        self.resync().await
    }

    /// Reconcile one order event and deliver its intents
    pub async fn handle_order_event(&mut self, raw: &RawChange) -> Vec<DispatchIntent> {
        let changes = self.orders.apply_raw(raw);
        if changes.is_empty() {
            return Vec::new();
        }
        let intents = notifier::intents(&changes, &self.ctx.notify_context());
        let outcomes = self.dispatcher.dispatch_all(&intents).await;
        tracing::debug!(
            changes = changes.len(),
            intents = intents.len(),
            alerted = outcomes.iter().filter(|o| o.alerted).count(),
            "Order event handled"
        );
        intents
    }

    pub fn handle_menu_event(&mut self, raw: &RawChange) {
        self.menu.apply_raw(raw);
    }

    /// Process everything already buffered on the feeds, without waiting
    ///
    /// Returns the intents delivered, in order.
    pub async fn process_pending(&mut self) -> ClientResult<Vec<DispatchIntent>> {
        let mut delivered = Vec::new();
        loop {
            match self.order_rx.try_recv() {
                Ok(raw) => delivered.extend(self.handle_order_event(&raw).await),
                Err(TryRecvError::Lagged(n)) => self.recover_from_lag(n).await?,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        loop {
            match self.menu_rx.try_recv() {
                Ok(raw) => self.handle_menu_event(&raw),
                Err(TryRecvError::Lagged(n)) => self.recover_from_lag(n).await?,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        Ok(delivered)
    }

    /// Consume the feeds until cancelled or a feed closes
    pub async fn run(&mut self, shutdown: CancellationToken) -> ClientResult<()> {
        loop {
            let event = tokio::select! {
                biased;
                _ = shutdown.cancelled() => FeedEvent::Shutdown,
                result = self.order_rx.recv() => FeedEvent::Order(result),
                result = self.menu_rx.recv() => FeedEvent::Menu(result),
            };

            match event {
                FeedEvent::Shutdown => {
                    tracing::info!("Session received shutdown signal");
                    return Ok(());
                }
                FeedEvent::Order(Ok(raw)) => {
                    self.handle_order_event(&raw).await;
                }
                FeedEvent::Menu(Ok(raw)) => self.handle_menu_event(&raw),
                FeedEvent::Order(Err(RecvError::Lagged(n))) | FeedEvent::Menu(Err(RecvError::Lagged(n))) => {
                    self.recover_from_lag(n).await?;
                }
                FeedEvent::Order(Err(RecvError::Closed)) | FeedEvent::Menu(Err(RecvError::Closed)) => {
                    tracing::info!("Change feed closed, session stopping");
                    return Ok(());
                }
            }
        }
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    pub fn order(&self, id: &str) -> Option<&Order> {
        self.orders.get(id)
    }

    /// Snapshot of the order mirror
    pub fn orders(&self) -> Vec<Order> {
        self.orders.orders()
    }

    pub fn menu(&self) -> &Mirror<MenuItem> {
        &self.menu
    }

    /// Daily sequence numbers over the current mirror
    pub fn sequences(&self) -> DailySequences {
        DailySequences::compute(&self.orders(), &self.ctx.zone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{AlertPresenter, NoPush};
    use crate::notifier::IntentKind;
    use crate::store::{MemoryStore, StoreResult};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use shared::feed::{ChangeKind, EntityKind};
    use shared::models::{MenuItemCreate, MenuItemPatch, OrderDraft, OrderLineItem, OrderPatch, Role};
    use shared::order::OrderStatus;

    #[derive(Default)]
    struct Alerts(Mutex<Vec<String>>);

    impl AlertPresenter for Alerts {
        fn present_alert(&self, title: &str, _body: &str, _icon: &str) {
            self.0.lock().push(title.to_string());
        }
    }

    fn dispatcher(role: Role, alerts: Arc<Alerts>) -> Dispatcher {
        Dispatcher::new(role, Arc::new(NoPush), alerts)
    }

    fn draft(owner: &str) -> OrderDraft {
        let line: OrderLineItem = serde_json::from_value(json!({
            "id": "m-1", "name": "麻婆豆腐", "price": 19, "quantity": 1
        }))
        .unwrap();
        OrderDraft::new(owner, vec![line])
    }

    #[tokio::test]
    async fn test_bootstrap_raises_no_alerts() {
        let store = Arc::new(MemoryStore::new());
        store.insert_order(draft("c-1")).await.unwrap();

        let alerts = Arc::new(Alerts::default());
        let mut kitchen = ClientSession::bootstrap(
            store.clone(),
            ClientContext::new("k-1", Role::Fulfiller),
            dispatcher(Role::Fulfiller, alerts.clone()),
        )
        .await
        .unwrap();

        assert_eq!(kitchen.orders().len(), 1);
        assert!(kitchen.process_pending().await.unwrap().is_empty());
        assert!(alerts.0.lock().is_empty());
    }

    #[tokio::test]
    async fn test_new_order_alerts_kitchen() {
        let store = Arc::new(MemoryStore::new());
        let alerts = Arc::new(Alerts::default());
        let mut kitchen = ClientSession::bootstrap(
            store.clone(),
            ClientContext::new("k-1", Role::Fulfiller),
            dispatcher(Role::Fulfiller, alerts.clone()),
        )
        .await
        .unwrap();

        let order = store.insert_order(draft("c-1")).await.unwrap();
        let intents = kitchen.process_pending().await.unwrap();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].kind, IntentKind::NewOrder);
        assert_eq!(alerts.0.lock().len(), 1);
        assert!(kitchen.order(&order.id).is_some());
    }

    #[tokio::test]
    async fn test_menu_feed_updates_mirror() {
        let store = Arc::new(MemoryStore::new());
        let mut session = ClientSession::bootstrap(
            store.clone(),
            ClientContext::new("c-1", Role::Requester),
            dispatcher(Role::Requester, Arc::new(Alerts::default())),
        )
        .await
        .unwrap();

        let item = store
            .insert_menu_item(MenuItemCreate {
                id: Some("m-9".to_string()),
                name: "米饭".to_string(),
                description: None,
                price: 2,
                stock: None,
                category: shared::models::Category::Staple,
                method: None,
                flavor: None,
                image: None,
                image_url: None,
                tags: None,
            })
            .await
            .unwrap();
        session.process_pending().await.unwrap();
        assert!(session.menu().contains(&item.id));

        store.delete_menu_item(&item.id).await.unwrap();
        session.process_pending().await.unwrap();
        assert!(session.menu().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_record_is_dropped() {
        let store = Arc::new(MemoryStore::new());
        let mut session = ClientSession::bootstrap(
            store.clone(),
            ClientContext::new("k-1", Role::Fulfiller),
            dispatcher(Role::Fulfiller, Arc::new(Alerts::default())),
        )
        .await
        .unwrap();

        store.publish_raw_order_change(RawChange::new(
            ChangeKind::Inserted,
            EntityKind::Order,
            json!({ "id": "o-x", "status": "sizzling" }),
        ));
        assert!(session.process_pending().await.unwrap().is_empty());
        assert!(session.orders().is_empty());
    }

    #[tokio::test]
    async fn test_lag_triggers_silent_resync() {
        let store = Arc::new(MemoryStore::with_capacity(2));
        let alerts = Arc::new(Alerts::default());
        let mut kitchen = ClientSession::bootstrap(
            store.clone(),
            ClientContext::new("k-1", Role::Fulfiller),
            dispatcher(Role::Fulfiller, alerts.clone()),
        )
        .await
        .unwrap();

        for _ in 0..5 {
            store.insert_order(draft("c-1")).await.unwrap();
        }
        let intents = kitchen.process_pending().await.unwrap();
        assert!(intents.is_empty());
        assert_eq!(kitchen.orders().len(), 5);

        // Back in step after the resync
        let first = kitchen.orders()[0].id.clone();
        store
            .update_order(
                &first,
                OrderPatch {
                    urgent: Some(true),
                    urgent_count: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let intents = kitchen.process_pending().await.unwrap();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].kind, IntentKind::Urgent);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let store = Arc::new(MemoryStore::new());
        let mut session = ClientSession::bootstrap(
            store.clone(),
            ClientContext::new("k-1", Role::Fulfiller),
            dispatcher(Role::Fulfiller, Arc::new(Alerts::default())),
        )
        .await
        .unwrap();

        let token = CancellationToken::new();
        token.cancel();
        session.run(token).await.unwrap();
    }

    /// Store where an order is placed, hurried and cooked while the first
    /// listing is being read
    struct BusyListing {
        inner: Arc<MemoryStore>,
    }

    impl BusyListing {
        async fn churn(&self) -> StoreResult<()> {
            self.inner.set_clock(1_000);
            let order = self.inner.insert_order(draft("c-1")).await?;
            let hurry = OrderPatch {
                expected_status: Some(OrderStatus::Pending),
                urgent: Some(true),
                urgent_count: Some(1),
                updated_at: Some(1_500),
                ..Default::default()
            };
            self.inner.update_order(&order.id, hurry).await?;
            let cook = OrderPatch {
                expected_status: Some(OrderStatus::Pending),
                status: Some(OrderStatus::Cooking),
                cooking_started_at: Some(2_000),
                updated_at: Some(2_000),
                ..Default::default()
            };
            self.inner.update_order(&order.id, cook).await?;
            Ok(())
        }
    }

    #[async_trait]
    impl OrderStore for BusyListing {
        async fn list_orders(&self) -> StoreResult<Vec<Order>> {
            self.churn().await?;
            self.inner.list_orders().await
        }

        async fn get_order(&self, id: &str) -> StoreResult<Order> {
            self.inner.get_order(id).await
        }

        async fn insert_order(&self, draft: OrderDraft) -> StoreResult<Order> {
            self.inner.insert_order(draft).await
        }

        async fn update_order(&self, id: &str, patch: OrderPatch) -> StoreResult<Order> {
            self.inner.update_order(id, patch).await
        }

        async fn delete_order(&self, id: &str) -> StoreResult<()> {
            self.inner.delete_order(id).await
        }

        fn subscribe_orders(&self) -> broadcast::Receiver<RawChange> {
            self.inner.subscribe_orders()
        }
    }

    #[async_trait]
    impl MenuStore for BusyListing {
        async fn list_menu_items(&self) -> StoreResult<Vec<MenuItem>> {
            self.inner.list_menu_items().await
        }

        async fn get_menu_item(&self, id: &str) -> StoreResult<MenuItem> {
            self.inner.get_menu_item(id).await
        }

        async fn insert_menu_item(&self, item: MenuItemCreate) -> StoreResult<MenuItem> {
            self.inner.insert_menu_item(item).await
        }

        async fn update_menu_item(&self, id: &str, patch: MenuItemPatch) -> StoreResult<MenuItem> {
            self.inner.update_menu_item(id, patch).await
        }

        async fn delete_menu_item(&self, id: &str) -> StoreResult<()> {
            self.inner.delete_menu_item(id).await
        }

        fn subscribe_menu(&self) -> broadcast::Receiver<RawChange> {
            self.inner.subscribe_menu()
        }
    }

    #[tokio::test]
    async fn test_history_inside_listing_raises_no_alerts() {
        let store = Arc::new(BusyListing {
            inner: Arc::new(MemoryStore::new()),
        });
        let alerts = Arc::new(Alerts::default());
        let mut kitchen = ClientSession::bootstrap(
            store.clone(),
            ClientContext::new("k-1", Role::Fulfiller),
            dispatcher(Role::Fulfiller, alerts.clone()),
        )
        .await
        .unwrap();

        // Insert, hurry and cook are all buffered behind the listing
        assert!(kitchen.process_pending().await.unwrap().is_empty());
        assert!(alerts.0.lock().is_empty());

        let orders = kitchen.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Cooking);
        assert_eq!(orders[0].urgent_count, 1);
    }
}

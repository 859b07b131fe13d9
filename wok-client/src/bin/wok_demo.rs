//! Two-client walkthrough against the in-memory store
//!
//! A customer orders 麻婆豆腐 × 2, the kitchen cooks and completes it. Set
//! `PUSHPLUS_*` variables to also deliver the notifications through PushPlus.

use anyhow::Context;
use shared::models::QuickOptions;
use std::sync::Arc;
use wok_client::logger::init_logger_with_file;
use wok_client::{
    Cart, CatalogService, ClientConfig, ClientContext, ClientSession, Dispatcher, LogAlerts, MemoryStore, MenuStore,
    NoPush, OrderService, PushDispatcher, Role, resolve_context,
};
use wok_push::PushPlusClient;

fn push_adapter(config: &ClientConfig) -> anyhow::Result<Arc<dyn PushDispatcher>> {
    if !config.push_enabled() {
        tracing::info!("PushPlus not configured, pushes disabled");
        return Ok(Arc::new(NoPush));
    }
    let client = PushPlusClient::new(config.pushplus()).context("building PushPlus client")?;
    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = ClientConfig::from_env().context("loading configuration")?;
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!("🍳 Wok demo starting...");

    let customer_ctx = resolve_context(&config.clone().with_role(Role::Requester))
        .context("resolving client identity")?
        .with_customer_name(Some(config.customer_name.clone().unwrap_or_else(|| "小蒋".to_string())));
    let kitchen_ctx = ClientContext::new("kitchen-demo", Role::Fulfiller).with_zone(config.zone);

    let store = Arc::new(MemoryStore::new());
    let push = push_adapter(&config)?;

    let catalog = CatalogService::new(store.clone());
    let added = catalog.sync_default_menu().await?;
    tracing::info!(count = added.len(), "Menu ready");

    let mut customer = ClientSession::bootstrap(
        store.clone(),
        customer_ctx.clone(),
        Dispatcher::new(Role::Requester, push.clone(), Arc::new(LogAlerts)),
    )
    .await?;
    let mut kitchen = ClientSession::bootstrap(
        store.clone(),
        kitchen_ctx,
        Dispatcher::new(Role::Fulfiller, push, Arc::new(LogAlerts)),
    )
    .await?;

    let service = OrderService::new(store.clone());

    // Customer composes and submits
    let mapo = store.get_menu_item("m-23").await?;
    let mut cart = Cart::new();
    cart.add(&mapo, 2, QuickOptions { spicy: true, ..Default::default() }, "")?;
    let order = service.submit(&mut cart, &customer_ctx).await?;
    customer.process_pending().await?;
    kitchen.process_pending().await?;

    let sequences = kitchen.sequences();
    tracing::info!(
        display_id = %sequences.display_id(&order),
        time = %sequences.display_time(&order),
        total = order.total_price,
        "Kitchen sees the new order"
    );

    // Kitchen works it
    service.start_cooking(&order.id).await?;
    customer.process_pending().await?;
    kitchen.process_pending().await?;

    let report = service.complete(&order.id).await?;
    customer.process_pending().await?;
    kitchen.process_pending().await?;
    if !report.is_clean() {
        tracing::warn!(failures = report.sales_failures.len(), "Some sales counters were not updated");
    }

    let sold = store.get_menu_item("m-23").await?.sales;
    tracing::info!(status = %report.order.status, sales = sold, "Demo finished");
    Ok(())
}

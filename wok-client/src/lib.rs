//! Wok Client - order lifecycle engine for one client
//!
//! A client is either a requester (customer) or a fulfiller (kitchen). Both
//! share one catalog and one order table held by an external store; each
//! client mirrors the tables from the store's change feeds, derives daily
//! sequence numbers, and turns observed transitions into notifications.

pub mod cart;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod logger;
pub mod notifier;
pub mod orders;
pub mod reconciler;
pub mod session;
pub mod store;
pub mod views;

pub use cart::{Cart, CartLine};
pub use catalog::CatalogService;
pub use config::{ClientConfig, ClientContext};
pub use dispatch::{AlertPresenter, DispatchOutcome, Dispatcher, LogAlerts, NoPush, PushDispatcher};
pub use error::{ClientError, ClientResult};
pub use identity::{Identity, IdentityStorage, resolve_context};
pub use notifier::{DispatchIntent, DispatchTarget, IntentKind, NotifyContext};
pub use orders::{CompletionReport, OrderService, SalesFailure};
pub use reconciler::{OrderChange, OrderReconciler};
pub use session::ClientSession;
pub use store::{MemoryStore, MenuStore, OrderStore, StoreError, StoreResult};

// Re-export shared types for convenience
pub use shared::models::{MenuItem, Order, Role};
pub use shared::order::OrderStatus;

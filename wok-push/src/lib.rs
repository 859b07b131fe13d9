//! # wok-push
//!
//! PushPlus WeChat push adapter - delivery only.
//!
//! ## Scope
//!
//! This crate handles HOW a message reaches a phone:
//! - PushPlus `send` API (one-to-one friend push)
//! - Per-role friend tokens
//! - HTML card rendering
//!
//! Deciding WHAT to push and to WHOM stays in application code
//! (the notifier in `wok-client`).
//!
//! ## Example
//!
//! ```ignore
//! use shared::models::Role;
//! use wok_push::{PushPlusClient, PushPlusConfig};
//!
//! let config = PushPlusConfig::new("sender-token")
//!     .with_friend_token(Role::Fulfiller, "kitchen-friend-token");
//! let client = PushPlusClient::new(config)?;
//! client.push_card("🆕", "New order", "麻婆豆腐 from Customer", Role::Fulfiller).await?;
//! ```

mod error;
mod pushplus;
mod template;

// Re-exports
pub use error::{PushError, PushResult};
pub use pushplus::{PUSHPLUS_ENDPOINT, PushMessage, PushPlusClient, PushPlusConfig};
pub use template::{escape_html, render_card};

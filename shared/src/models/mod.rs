//! Data models
//!
//! Records exchanged with the store and carried on the change feed.
//! All IDs are opaque strings; all timestamps are `i64` Unix millis.

pub mod menu_item;
pub mod order;
pub mod role;

// Re-exports
pub use menu_item::*;
pub use order::*;
pub use role::*;

//! Shared types for the Wok ordering workspace
//!
//! Domain models, the order state machine and sequencer, change-feed boundary
//! types and the unified error system. Everything here is pure: no I/O, no
//! runtime, no subscriber setup.

pub mod error;
pub mod feed;
pub mod models;
pub mod order;
pub mod time;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
pub use time::BusinessZone;

//! Order domain
//!
//! - [`status`]: the status state machine
//! - [`lifecycle`]: guarded patch planning for every mutation
//! - [`sequence`]: per-day display numbering

pub mod error;
pub mod lifecycle;
pub mod sequence;
pub mod status;

// Re-exports
pub use error::OrderError;
pub use lifecycle::{adjust_line_quantity, check_patch, plan_edit, plan_escalation, plan_restore, plan_transition};
pub use sequence::{DailySequences, DaySequence, NOT_AVAILABLE};
pub use status::{OrderStatus, can_transition};

//! Daily sequence numbering
//!
//! Orders are numbered per calendar day in the business zone, in creation
//! order: `20251130-001`, `20251130-002`, ... The numbering is recomputed
//! from the full snapshot on every call, so any two clients holding the same
//! set of orders render the same ids.

use crate::models::Order;
use crate::time::{self, BusinessZone};
use std::collections::HashMap;

/// Rendered for orders without a creation timestamp
pub const NOT_AVAILABLE: &str = "N/A";

/// Position of one order within its day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySequence {
    /// `YYYYMMDD`
    pub day_key: String,
    /// 1-based
    pub seq: u32,
}

impl DaySequence {
    /// `YYYYMMDD-NNN`
    pub fn display_id(&self) -> String {
        format!("{}-{:03}", self.day_key, self.seq)
    }
}

/// Sequence numbers for one snapshot of orders
#[derive(Debug, Clone, Default)]
pub struct DailySequences {
    by_id: HashMap<String, DaySequence>,
    by_created_at: HashMap<i64, DaySequence>,
    zone: BusinessZone,
}

impl DailySequences {
    /// Number every order that has a creation timestamp
    ///
    /// Ties on `created_at` are broken by order id. Orders without a
    /// timestamp are skipped and render as [`NOT_AVAILABLE`].
    pub fn compute(orders: &[Order], zone: &BusinessZone) -> Self {
        let mut stamped: Vec<(i64, &str)> = orders
            .iter()
            .filter_map(|o| o.created_at.map(|ts| (ts, o.id.as_str())))
            .collect();
        stamped.sort_unstable();

        let mut by_id = HashMap::with_capacity(stamped.len());
        let mut by_created_at = HashMap::with_capacity(stamped.len());
        let mut counters: HashMap<String, u32> = HashMap::new();

        for (created_at, id) in stamped {
            let Some(day_key) = time::date_key(created_at, zone) else {
                tracing::warn!(order_id = %id, created_at, "Timestamp out of range, not sequenced");
                continue;
            };
            let counter = counters.entry(day_key.clone()).or_insert(0);
            *counter += 1;
            let entry = DaySequence {
                day_key,
                seq: *counter,
            };
            // First order wins the timestamp slot on ties
            by_created_at.entry(created_at).or_insert_with(|| entry.clone());
            by_id.insert(id.to_string(), entry);
        }

        Self {
            by_id,
            by_created_at,
            zone: *zone,
        }
    }

    pub fn sequence_of(&self, order_id: &str) -> Option<&DaySequence> {
        self.by_id.get(order_id)
    }

    /// Lookup for callers that only hold the creation timestamp
    pub fn sequence_at(&self, created_at: i64) -> Option<&DaySequence> {
        self.by_created_at.get(&created_at)
    }

    /// `YYYYMMDD-NNN`, or `N/A`
    pub fn display_id(&self, order: &Order) -> String {
        self.sequence_of(&order.id)
            .map(DaySequence::display_id)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// `HH:MM:SS` of the creation time, or `N/A`
    pub fn display_time(&self, order: &Order) -> String {
        order
            .created_at
            .and_then(|ts| time::display_time(ts, &self.zone))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

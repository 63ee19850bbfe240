//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Table occupancy status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    #[default]
    Free,
    Occupied,
    /// Closed for service (administrative)
    Closed,
}

/// Dining table entity (桌台)
///
/// A table is OCCUPIED iff it holds a `current_order_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: String,
    /// Stable, unique table number
    pub number: u32,
    pub status: TableStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_order_id: Option<String>,
    /// Claim timestamp (Unix millis), set together with `current_order_id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupied_at: Option<i64>,
}

impl DiningTable {
    pub fn new(number: u32) -> Self {
        Self {
            id: format!("table-{number}"),
            number,
            status: TableStatus::Free,
            current_order_id: None,
            occupied_at: None,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.current_order_id.is_some()
    }
}

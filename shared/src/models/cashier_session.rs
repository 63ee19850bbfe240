//! Cashier Session Model (收银班次)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Open,
    Closed,
}

/// Cashier session - one register shift
///
/// At most one session is OPEN system-wide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashierSession {
    pub id: String,
    pub status: SessionStatus,
    /// Opening time (Unix millis)
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    /// Opening float
    pub initial_amount: Decimal,
    pub opened_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<String>,
    /// Cash physically counted at close
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counted_cash: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CashierSession {
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }
}

/// Derived session summary (never stored)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub order_count: usize,
    pub cash_total: Decimal,
    pub card_total: Decimal,
    pub instant_transfer_total: Decimal,
    pub grand_total: Decimal,
    pub initial_amount: Decimal,
    /// Opening float + cash total
    pub expected_cash: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counted_cash: Option<Decimal>,
    /// counted - expected (only when cash was counted at close)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variance: Option<Decimal>,
}

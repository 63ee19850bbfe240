//! Order snapshot - computed state from event stream
//!
//! The snapshot includes a `state_checksum` field for drift detection:
//! a snapshot rebuilt from the event stream must carry the same checksum
//! as the stored one.

use super::types::{CustomerInfo, OrderChannel, OrderItem, PaymentType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Order status
///
/// `NEW → PREPARING → READY → PAID`, plus terminal `CANCELED` reachable
/// from any non-PAID state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    New,
    Preparing,
    Ready,
    Paid,
    Canceled,
}

impl OrderStatus {
    /// Next kitchen status (only NEW → PREPARING → READY)
    pub fn next_kitchen_status(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::New => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Canceled)
    }

    /// Position in the forward lifecycle
    pub fn rank(&self) -> u8 {
        match self {
            OrderStatus::New => 0,
            OrderStatus::Preparing => 1,
            OrderStatus::Ready => 2,
            OrderStatus::Paid | OrderStatus::Canceled => 3,
        }
    }
}

/// Order snapshot - computed from event stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    /// Order ID (assigned by server)
    pub order_id: String,
    /// Receipt number (ORD{yyyymmdd}{10000+n})
    #[serde(default)]
    pub receipt_number: String,
    pub channel: OrderChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerInfo>,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    /// Σ unit_price × quantity
    pub subtotal: Decimal,
    #[serde(default)]
    pub delivery_fee: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    /// max(0, subtotal + delivery_fee - discount)
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<PaymentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_received: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,
    /// Owning cashier session (stamped at settlement, "manual" without one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Operator who created the order
    #[serde(default)]
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceled_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    /// Last applied event sequence
    #[serde(default)]
    pub last_sequence: u64,
    /// State checksum for drift detection
    #[serde(default)]
    pub state_checksum: String,
}

impl OrderSnapshot {
    /// Create a new empty order
    pub fn new(order_id: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let mut snapshot = Self {
            order_id,
            receipt_number: String::new(),
            channel: OrderChannel::Counter,
            table_number: None,
            customer: None,
            status: OrderStatus::New,
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            delivery_fee: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::ZERO,
            payment_type: None,
            amount_received: None,
            change: None,
            session_id: None,
            created_by: String::new(),
            created_at: now,
            updated_at: now,
            paid_at: None,
            delivered_at: None,
            canceled_at: None,
            cancel_reason: None,
            last_sequence: 0,
            state_checksum: String::new(),
        };
        snapshot.update_checksum();
        snapshot
    }

    pub fn is_paid(&self) -> bool {
        self.status == OrderStatus::Paid
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether any line needs kitchen preparation
    pub fn has_kitchen_items(&self) -> bool {
        self.items.iter().any(|i| i.is_kitchen_item)
    }

    /// Delivery/pickup order that is READY and not yet handed over
    pub fn awaits_delivery(&self) -> bool {
        self.channel.is_remote()
            && self.status == OrderStatus::Ready
            && self.delivered_at.is_none()
    }

    pub fn item(&self, instance_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.instance_id == instance_id)
    }

    /// Compute state checksum for drift detection
    ///
    /// Fields included: item count, total, last sequence, status.
    /// Returns a 16-character hex string.
    pub fn compute_checksum(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher as _;

        let mut hasher = DefaultHasher::new();
        self.items.len().hash(&mut hasher);
        self.total.normalize().hash(&mut hasher);
        self.last_sequence.hash(&mut hasher);
        self.status.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    /// Update the state_checksum field based on current state
    pub fn update_checksum(&mut self) {
        self.state_checksum = self.compute_checksum();
    }

    /// Returns false if drift was detected
    pub fn verify_checksum(&self) -> bool {
        self.state_checksum == self.compute_checksum()
    }
}

//! Order events - immutable facts recorded after command processing

use super::snapshot::OrderStatus;
use super::types::{CustomerInfo, OrderChannel, OrderItem, PaymentType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (for ordering and replay)
    pub sequence: u64,
    /// Order this event belongs to
    pub order_id: String,
    /// Server timestamp (Unix milliseconds), authoritative for state evolution
    pub timestamp: i64,
    /// Client timestamp (Unix milliseconds), kept for audit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<i64>,
    /// Operator who triggered this event
    pub operator_id: String,
    /// Operator name (snapshot for audit)
    pub operator_name: String,
    /// Command that triggered this event
    pub command_id: String,
    pub event_type: OrderEventType,
    pub payload: EventPayload,
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    // Lifecycle
    OrderCreated,
    StatusAdvanced,
    OrderSettled,
    OrderDelivered,
    OrderCanceled,

    // Items
    ItemAdded,
    ItemQuantityChanged,

    // Other
    CustomerUpdated,
    AdjustmentsApplied,
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderEventType::OrderCreated => write!(f, "ORDER_CREATED"),
            OrderEventType::StatusAdvanced => write!(f, "STATUS_ADVANCED"),
            OrderEventType::OrderSettled => write!(f, "ORDER_SETTLED"),
            OrderEventType::OrderDelivered => write!(f, "ORDER_DELIVERED"),
            OrderEventType::OrderCanceled => write!(f, "ORDER_CANCELED"),
            OrderEventType::ItemAdded => write!(f, "ITEM_ADDED"),
            OrderEventType::ItemQuantityChanged => write!(f, "ITEM_QUANTITY_CHANGED"),
            OrderEventType::CustomerUpdated => write!(f, "CUSTOMER_UPDATED"),
            OrderEventType::AdjustmentsApplied => write!(f, "ADJUSTMENTS_APPLIED"),
        }
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ========== Lifecycle ==========
    OrderCreated {
        /// Server-generated receipt number
        receipt_number: String,
        channel: OrderChannel,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table_number: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        customer: Option<CustomerInfo>,
        /// Lines with prices captured from the catalog
        items: Vec<OrderItem>,
        delivery_fee: Decimal,
        discount: Decimal,
    },

    StatusAdvanced {
        from: OrderStatus,
        to: OrderStatus,
    },

    OrderSettled {
        payment_type: PaymentType,
        /// Order total at settlement
        total: Decimal,
        amount_received: Decimal,
        change: Decimal,
        /// Open cashier session, or "manual"
        session_id: String,
    },

    OrderDelivered {},

    OrderCanceled {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        previous_status: OrderStatus,
    },

    // ========== Items ==========
    ItemAdded {
        /// Line as added; merges into an existing line with the same instance id
        item: OrderItem,
    },

    ItemQuantityChanged {
        instance_id: String,
        product_id: String,
        previous_quantity: i32,
        /// 0 removes the line
        new_quantity: i32,
    },

    // ========== Other ==========
    CustomerUpdated {
        customer: CustomerInfo,
    },

    AdjustmentsApplied {
        delivery_fee: Decimal,
        discount: Decimal,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> OrderEventType {
        match self {
            EventPayload::OrderCreated { .. } => OrderEventType::OrderCreated,
            EventPayload::StatusAdvanced { .. } => OrderEventType::StatusAdvanced,
            EventPayload::OrderSettled { .. } => OrderEventType::OrderSettled,
            EventPayload::OrderDelivered {} => OrderEventType::OrderDelivered,
            EventPayload::OrderCanceled { .. } => OrderEventType::OrderCanceled,
            EventPayload::ItemAdded { .. } => OrderEventType::ItemAdded,
            EventPayload::ItemQuantityChanged { .. } => OrderEventType::ItemQuantityChanged,
            EventPayload::CustomerUpdated { .. } => OrderEventType::CustomerUpdated,
            EventPayload::AdjustmentsApplied { .. } => OrderEventType::AdjustmentsApplied,
        }
    }
}

impl OrderEvent {
    /// Create a new event
    ///
    /// The server timestamp is always set here; `client_timestamp` is the
    /// command's own timestamp and may differ due to clock skew.
    pub fn new(
        sequence: u64,
        order_id: String,
        operator_id: String,
        operator_name: String,
        command_id: String,
        client_timestamp: Option<i64>,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            order_id,
            timestamp: chrono::Utc::now().timestamp_millis(),
            client_timestamp,
            operator_id,
            operator_name,
            command_id,
            event_type: payload.event_type(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_follows_payload() {
        let event = OrderEvent::new(
            7,
            "order-1".to_string(),
            "u-1".to_string(),
            "Ana".to_string(),
            "cmd-1".to_string(),
            None,
            EventPayload::OrderDelivered {},
        );
        assert_eq!(event.event_type, OrderEventType::OrderDelivered);
        assert_eq!(event.event_type.to_string(), "ORDER_DELIVERED");
    }

    #[test]
    fn test_payload_json_tag() {
        let payload = EventPayload::StatusAdvanced {
            from: OrderStatus::New,
            to: OrderStatus::Preparing,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "STATUS_ADVANCED");
        assert_eq!(json["to"], "PREPARING");
    }
}

//! Order commands - requests from clients to modify orders

use super::types::{CustomerInfo, OrderChannel, OrderItemInput, PaymentInput};
use crate::models::{Actor, Role};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order command envelope
///
/// `command_id` is chosen by the client and reused on retries; a command id
/// that was already processed is acknowledged without re-executing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCommand {
    pub command_id: String,
    pub operator_id: String,
    pub operator_name: String,
    pub role: Role,
    /// Client timestamp (Unix millis), kept for audit only
    pub timestamp: i64,
    pub payload: OrderCommandPayload,
}

impl OrderCommand {
    /// Build a command for an actor with a fresh command id
    pub fn new(actor: &Actor, payload: OrderCommandPayload) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            operator_id: actor.user_id.clone(),
            operator_name: actor.name.clone(),
            role: actor.role,
            timestamp: chrono::Utc::now().timestamp_millis(),
            payload,
        }
    }

    /// Reuse a specific command id (client retries)
    pub fn with_command_id(mut self, command_id: impl Into<String>) -> Self {
        self.command_id = command_id.into();
        self
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.operator_id.clone(), self.operator_name.clone(), self.role)
    }
}

/// Command payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderCommandPayload {
    /// Create an order; with `settle_immediately` a non-kitchen order is
    /// created directly as PAID
    CreateOrder {
        channel: OrderChannel,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table_number: Option<u32>,
        items: Vec<OrderItemInput>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        customer: Option<CustomerInfo>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delivery_fee: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discount: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        settle_immediately: Option<PaymentInput>,
    },

    /// Create a delivery/pickup order from the operator's persisted cart
    CheckoutCart {
        channel: OrderChannel,
        customer: CustomerInfo,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delivery_fee: Option<Decimal>,
    },

    AddItem {
        order_id: String,
        item: OrderItemInput,
    },

    /// Relative quantity change; clamps at zero, zero removes the line.
    /// `instance_id` picks the line when several share the product.
    ChangeQuantity {
        order_id: String,
        product_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instance_id: Option<String>,
        delta: i32,
    },

    AdvanceStatus {
        order_id: String,
    },

    Settle {
        order_id: String,
        payment: PaymentInput,
    },

    MarkDelivered {
        order_id: String,
    },

    CancelOrder {
        order_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    UpdateCustomer {
        order_id: String,
        customer: CustomerInfo,
    },

    ApplyAdjustments {
        order_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delivery_fee: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discount: Option<Decimal>,
    },
}

impl OrderCommandPayload {
    /// Target order of the command (None for commands that create one)
    pub fn order_id(&self) -> Option<&str> {
        match self {
            OrderCommandPayload::CreateOrder { .. } | OrderCommandPayload::CheckoutCart { .. } => {
                None
            }
            OrderCommandPayload::AddItem { order_id, .. }
            | OrderCommandPayload::ChangeQuantity { order_id, .. }
            | OrderCommandPayload::AdvanceStatus { order_id }
            | OrderCommandPayload::Settle { order_id, .. }
            | OrderCommandPayload::MarkDelivered { order_id }
            | OrderCommandPayload::CancelOrder { order_id, .. }
            | OrderCommandPayload::UpdateCustomer { order_id, .. }
            | OrderCommandPayload::ApplyAdjustments { order_id, .. } => Some(order_id),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OrderCommandPayload::CreateOrder { .. } => "CREATE_ORDER",
            OrderCommandPayload::CheckoutCart { .. } => "CHECKOUT_CART",
            OrderCommandPayload::AddItem { .. } => "ADD_ITEM",
            OrderCommandPayload::ChangeQuantity { .. } => "CHANGE_QUANTITY",
            OrderCommandPayload::AdvanceStatus { .. } => "ADVANCE_STATUS",
            OrderCommandPayload::Settle { .. } => "SETTLE",
            OrderCommandPayload::MarkDelivered { .. } => "MARK_DELIVERED",
            OrderCommandPayload::CancelOrder { .. } => "CANCEL_ORDER",
            OrderCommandPayload::UpdateCustomer { .. } => "UPDATE_CUSTOMER",
            OrderCommandPayload::ApplyAdjustments { .. } => "APPLY_ADJUSTMENTS",
        }
    }
}

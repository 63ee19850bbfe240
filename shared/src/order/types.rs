//! Shared types for the order engine

use crate::error::{AppError, ErrorCategory, ErrorCode, ErrorKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// Channel / Payment
// ============================================================================

/// 下单渠道
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderChannel {
    /// 柜台
    Counter,
    /// 堂食桌台
    Table,
    /// 外卖
    Delivery,
    /// 自取
    Pickup,
}

impl OrderChannel {
    /// Delivery and pickup orders are handed over, and may be created by customers
    pub fn is_remote(&self) -> bool {
        matches!(self, OrderChannel::Delivery | OrderChannel::Pickup)
    }
}

/// 支付方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Cash,
    Card,
    InstantTransfer,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Cash => "CASH",
            PaymentType::Card => "CARD",
            PaymentType::InstantTransfer => "INSTANT_TRANSFER",
        }
    }
}

/// Settlement request
///
/// `amount_tendered` is required for cash; non-cash payments are recorded
/// as exactly the order total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentInput {
    pub payment_type: PaymentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_tendered: Option<Decimal>,
}

impl PaymentInput {
    pub fn cash(tendered: Decimal) -> Self {
        Self {
            payment_type: PaymentType::Cash,
            amount_tendered: Some(tendered),
        }
    }

    pub fn card() -> Self {
        Self {
            payment_type: PaymentType::Card,
            amount_tendered: None,
        }
    }

    pub fn instant_transfer() -> Self {
        Self {
            payment_type: PaymentType::InstantTransfer,
            amount_tendered: None,
        }
    }
}

// ============================================================================
// Customer
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CustomerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// ============================================================================
// Items
// ============================================================================

/// Item input (from client), price always comes from the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemInput {
    pub product_id: String,
    pub quantity: i32,
    /// option group name -> chosen label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderItemInput {
    pub fn new(product_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            selected_options: None,
            notes: None,
        }
    }
}

/// Order line - captured product data plus quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// Product ID
    pub product_id: String,
    /// Instance ID (content-addressed hash, identical lines share it)
    pub instance_id: String,
    /// Product name at add time
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit price at add time
    pub unit_price: Decimal,
    /// Quantity (>= 1 while the line exists)
    pub quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<BTreeMap<String, String>>,
    /// Captured from the product's `requires_preparation`
    #[serde(default)]
    pub is_kitchen_item: bool,
    /// unit_price × quantity
    #[serde(default)]
    pub line_total: Decimal,
}

// ============================================================================
// Command Response
// ============================================================================

/// Command response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    /// Order the command acted on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Command id was already processed, nothing re-executed
    #[serde(default)]
    pub duplicate: bool,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, order_id: Option<String>) -> Self {
        Self {
            command_id,
            success: true,
            order_id,
            duplicate: false,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            order_id: None,
            duplicate: false,
            error: Some(error),
        }
    }

    pub fn duplicate(command_id: String) -> Self {
        Self {
            command_id,
            success: true,
            order_id: None,
            duplicate: true,
            error: None,
        }
    }

    /// Error code of a failed response
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }

    /// Failure kind of a failed response
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.code.kind())
    }
}

/// Command error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandError {
    pub code: ErrorCode,
    /// Domain of the code (order, payment, table...), for client-side routing
    pub category: ErrorCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl CommandError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            category: code.category(),
            message: message.into(),
            details: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }
}

impl From<AppError> for CommandError {
    fn from(err: AppError) -> Self {
        Self {
            code: err.code,
            category: err.code.category(),
            message: err.message,
            details: err.details,
        }
    }
}

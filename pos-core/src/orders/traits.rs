//! Core traits of the order engine
//!
//! - [`CommandHandler`]: validates a command against the current state and
//!   produces events (no mutation)
//! - [`EventApplier`]: folds one event into a snapshot (pure)
//! - [`CommandContext`]: transactional view handed to handlers

use crate::sessions;
use crate::settings::SETTINGS_KEY;
use crate::store::{Collection, Store, StorageError};
use enum_dispatch::enum_dispatch;
use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{Product, StoreSettings};
use shared::order::{OrderEvent, OrderSnapshot, OrderStatus};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by command handlers
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order has no items")]
    OrderEmpty,

    #[error("Cannot {action} an order in {from:?} status")]
    InvalidTransition {
        from: OrderStatus,
        action: &'static str,
    },

    #[error("Order is paid and can no longer change: {0}")]
    OrderFrozen(String),

    #[error("Order is canceled: {0}")]
    OrderCanceled(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Several lines of product {0} exist, an instance id is required")]
    AmbiguousItem(String),

    #[error("Order has items that need kitchen preparation")]
    KitchenItemsPending,

    #[error("Order cannot be delivered: {0}")]
    NotDeliverable(String),

    #[error("Insufficient payment: total {total}, tendered {tendered}")]
    InsufficientPayment { total: Decimal, tendered: Decimal },

    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount { field: &'static str, value: Decimal },

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Product is not available: {0}")]
    ProductInactive(String),

    #[error("Invalid option selection: {0}")]
    InvalidOptionSelection(String),

    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl OrderError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        OrderError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            OrderError::OrderNotFound(_) => ErrorCode::OrderNotFound,
            OrderError::OrderEmpty => ErrorCode::OrderEmpty,
            OrderError::InvalidTransition { .. } => ErrorCode::InvalidStatusTransition,
            OrderError::OrderFrozen(_) => ErrorCode::OrderFrozen,
            OrderError::OrderCanceled(_) => ErrorCode::OrderCanceled,
            OrderError::ItemNotFound(_) => ErrorCode::ItemNotFound,
            OrderError::AmbiguousItem(_) => ErrorCode::AmbiguousItem,
            OrderError::KitchenItemsPending => ErrorCode::KitchenItemsPending,
            OrderError::NotDeliverable(_) => ErrorCode::NotDeliverable,
            OrderError::InsufficientPayment { .. } => ErrorCode::InsufficientPayment,
            OrderError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            OrderError::ProductNotFound(_) => ErrorCode::ProductNotFound,
            OrderError::ProductInactive(_) => ErrorCode::ProductInactive,
            OrderError::InvalidOptionSelection(_) => ErrorCode::InvalidOptionSelection,
            OrderError::Validation { .. } => ErrorCode::ValidationFailed,
            OrderError::Storage(e) => e.code(),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Storage(e) => e.into(),
            OrderError::InsufficientPayment { total, tendered } => AppError::with_message(
                ErrorCode::InsufficientPayment,
                format!("Insufficient payment: total {total}, tendered {tendered}"),
            )
            .with_detail("total", total.to_string())
            .with_detail("tendered", tendered.to_string()),
            OrderError::InvalidAmount { field, value } => AppError::with_message(
                ErrorCode::InvalidAmount,
                format!("{field} must not be negative, got {value}"),
            )
            .with_detail("field", field),
            OrderError::Validation { field, message } => {
                AppError::invalid_field(field, message)
            }
            OrderError::InvalidTransition { from, action } => {
                let code = ErrorCode::InvalidStatusTransition;
                AppError::with_message(code, format!("Cannot {action} an order in {from:?} status"))
                    .with_detail("status", format!("{from:?}").to_uppercase())
            }
            OrderError::OrderNotFound(ref id)
            | OrderError::OrderFrozen(ref id)
            | OrderError::OrderCanceled(ref id) => {
                let id = id.clone();
                AppError::with_message(err.code(), err.to_string()).with_detail("order_id", id)
            }
            OrderError::ProductNotFound(ref id) | OrderError::ProductInactive(ref id) => {
                let id = id.clone();
                AppError::with_message(err.code(), err.to_string()).with_detail("product_id", id)
            }
            other => AppError::with_message(other.code(), other.to_string()),
        }
    }
}

/// Metadata of the command being executed
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub operator_id: String,
    pub operator_name: String,
    /// Client timestamp
    pub timestamp: i64,
}

/// Transactional context for command handlers
///
/// Snapshots loaded through the context see earlier changes of the same
/// command (an order created and settled in one command).
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    store: &'a Store,
    sequence: u64,
    snapshots: HashMap<String, OrderSnapshot>,
}

impl<'a> CommandContext<'a> {
    pub fn new(txn: &'a WriteTransaction, store: &'a Store, current_sequence: u64) -> Self {
        Self {
            txn,
            store,
            sequence: current_sequence,
            snapshots: HashMap::new(),
        }
    }

    /// Allocate the next global event sequence
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    /// Load an order snapshot (pending changes first, then the store)
    pub fn load_snapshot(&self, order_id: &str) -> Result<OrderSnapshot, OrderError> {
        if let Some(snapshot) = self.snapshots.get(order_id) {
            return Ok(snapshot.clone());
        }
        self.store
            .get_txn::<OrderSnapshot>(self.txn, Collection::Orders, order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
    }

    /// Snapshot an event applies to; only a missing order starts blank
    pub fn load_or_new(&self, order_id: &str) -> Result<OrderSnapshot, OrderError> {
        match self.load_snapshot(order_id) {
            Err(OrderError::OrderNotFound(_)) => Ok(OrderSnapshot::new(order_id.to_string())),
            other => other,
        }
    }

    pub fn save_snapshot(&mut self, snapshot: OrderSnapshot) {
        self.snapshots.insert(snapshot.order_id.clone(), snapshot);
    }

    /// Snapshots touched by this command, consuming the context
    pub fn into_modified_snapshots(self) -> Vec<OrderSnapshot> {
        self.snapshots.into_values().collect()
    }

    /// Catalog lookup inside the command's transaction
    pub fn load_product(&self, product_id: &str) -> Result<Product, OrderError> {
        self.store
            .get_txn::<Product>(self.txn, Collection::Products, product_id)?
            .ok_or_else(|| OrderError::ProductNotFound(product_id.to_string()))
    }

    pub fn store_settings(&self) -> Result<StoreSettings, OrderError> {
        Ok(self
            .store
            .get_txn::<StoreSettings>(self.txn, Collection::Settings, SETTINGS_KEY)?
            .unwrap_or_default())
    }

    /// Open cashier session id, or "manual"
    pub fn settlement_session_id(&self) -> Result<String, OrderError> {
        Ok(sessions::settlement_session_id_txn(self.store, self.txn)?)
    }

    pub fn txn(&self) -> &WriteTransaction {
        self.txn
    }

    pub fn store(&self) -> &Store {
        self.store
    }
}

/// Command handler - validates and produces events
pub trait CommandHandler {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError>;
}

/// Event applier - folds an event into a snapshot
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_or_new() {
        let store = Store::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store
            .put_txn(&txn, Collection::Orders, "broken", &"not an order")
            .unwrap();
        let ctx = CommandContext::new(&txn, &store, 0);

        let fresh = ctx.load_or_new("o-1").unwrap();
        assert_eq!(fresh.order_id, "o-1");
        assert_eq!(fresh.status, OrderStatus::New);

        // 读不出来的文档不能被当成新订单覆盖
        assert!(matches!(ctx.load_or_new("broken"), Err(OrderError::Storage(_))));
    }
}

//! OrdersManager - Core command processing and event generation
//!
//! This module handles:
//! - Role gating and command validation
//! - Event generation with global sequence numbers
//! - Persistence to redb (one write transaction per command)
//! - Snapshot updates
//! - Table occupancy around table orders
//! - Event broadcasting
//!
//! # Command Flow
//!
//! ```text
//! execute_command(cmd)
//!     ├─ 1. Role gate
//!     ├─ 2. Idempotency check (command_id)
//!     ├─ 3. Creating commands: order id, table claim, receipt number
//!     ├─ 4. Begin write transaction (idempotency re-checked inside)
//!     ├─ 5. Convert command to action and execute
//!     ├─ 6. Apply events to snapshots via EventApplier
//!     ├─ 7. Persist events, snapshots, counters, processed command
//!     ├─ 8. Commit transaction
//!     ├─ 9. Release tables of orders that became terminal
//!     └─ 10. Broadcast event(s) and return response
//! ```
//!
//! The table claim (3) and release (9) are separate transactions from the
//! order write. A failed command drops its own claim; anything a crash
//! leaves behind is healed by [`TableRegistry::reconcile`].

mod error;
pub use error::*;

use super::actions::{CommandAction, PreparedOrder};
use super::appliers::{self, EventAction};
use super::traits::{CommandContext, CommandHandler, CommandMetadata, EventApplier};
use crate::auth;
use crate::store::{Collection, Store, StoreChange};
use crate::tables::TableRegistry;
use crate::utils::time;
use chrono_tz::Tz;
use shared::order::{
    CommandError, CommandResponse, OrderChannel, OrderCommand, OrderCommandPayload, OrderEvent,
    OrderSnapshot, OrderStatus,
};
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Counter holding the last global event sequence
const SEQUENCE_COUNTER: &str = "sequence";

/// Counter feeding receipt numbers
const ORDER_COUNTER: &str = "order_count";

/// OrdersManager for command processing
///
/// The `epoch` field is a unique identifier generated on each startup.
/// Subscribers use it to detect restarts and reload their state.
#[derive(Clone)]
pub struct OrdersManager {
    store: Store,
    tables: TableRegistry,
    event_tx: broadcast::Sender<OrderEvent>,
    epoch: String,
    /// 业务时区 (receipt dates)
    tz: Tz,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("store", &self.store)
            .field("event_tx", &"<broadcast::Sender>")
            .field("epoch", &self.epoch)
            .field("tz", &self.tz)
            .finish()
    }
}

impl OrdersManager {
    pub fn new(store: Store, tables: TableRegistry, tz: Tz) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(epoch = %epoch, "OrdersManager started with new epoch");
        Self {
            store,
            tables,
            event_tx,
            epoch,
            tz,
        }
    }

    /// Create an OrdersManager over an existing store (for testing)
    #[cfg(test)]
    pub fn with_storage(store: Store) -> Self {
        let tables = TableRegistry::new(store.clone(), crate::tables::DEFAULT_CLAIM_GRACE_MS);
        Self::new(store, tables, chrono_tz::America::Sao_Paulo)
    }

    /// Get the server epoch (unique instance ID)
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    /// Generate next receipt number: ORD{yyyymmdd}{10000+n}
    fn next_receipt_number(&self) -> ManagerResult<String> {
        let count = self.store.next_counter(ORDER_COUNTER)?;
        let date = time::today(self.tz).format("%Y%m%d");
        Ok(format!("ORD{}{}", date, 10000 + count))
    }

    /// Execute a command and return the response
    pub fn execute_command(&self, cmd: OrderCommand) -> CommandResponse {
        let command_id = cmd.command_id.clone();
        match self.process_command(cmd) {
            Ok((response, events)) => {
                // Broadcast events after successful commit
                for event in events {
                    if self.event_tx.send(event).is_err() {
                        tracing::debug!("Event broadcast skipped: no active receivers");
                        break;
                    }
                }
                response
            }
            Err(err) => {
                let error: CommandError = err.into();
                tracing::info!(
                    command_id = %command_id,
                    category = error.category.name(),
                    code = error.code.code(),
                    error = %error.message,
                    "Command rejected"
                );
                CommandResponse::error(command_id, error)
            }
        }
    }

    /// Process command and return response with events
    fn process_command(
        &self,
        cmd: OrderCommand,
    ) -> ManagerResult<(CommandResponse, Vec<OrderEvent>)> {
        tracing::debug!(
            command_id = %cmd.command_id,
            command = cmd.payload.name(),
            operator_id = %cmd.operator_id,
            "Processing command"
        );

        // 1. Role gate
        auth::authorize_command(&cmd)?;

        // 2. Idempotency check (before transaction)
        if self.store.is_command_processed(&cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command");
            return Ok((CommandResponse::duplicate(cmd.command_id), vec![]));
        }

        // 3. Creating commands get their order id before the table claim
        let (order_id, creating) = match cmd.payload.order_id() {
            Some(id) => (id.to_string(), false),
            None => (uuid::Uuid::new_v4().to_string(), true),
        };

        let claimed_table = match &cmd.payload {
            OrderCommandPayload::CreateOrder {
                channel: OrderChannel::Table,
                table_number: Some(number),
                ..
            } => {
                self.tables.occupy(*number, &order_id)?;
                Some(*number)
            }
            _ => None,
        };

        let result = self.process_in_transaction(&cmd, &order_id, creating);

        // Compensate: a claim whose order was never written must not linger
        if let Some(number) = claimed_table {
            let written = matches!(&result, Ok((response, _)) if !response.duplicate);
            if !written && let Err(e) = self.tables.release_claim(number, &order_id) {
                tracing::warn!(
                    table_number = number,
                    order_id = %order_id,
                    error = %e,
                    "Failed to drop table claim"
                );
            }
        }
        result
    }

    fn process_in_transaction(
        &self,
        cmd: &OrderCommand,
        order_id: &str,
        creating: bool,
    ) -> ManagerResult<(CommandResponse, Vec<OrderEvent>)> {
        // Receipt counter uses its own write transaction (redb has no nesting)
        let prepared = if creating {
            let receipt_number = self.next_receipt_number()?;
            tracing::debug!(receipt_number = %receipt_number, "Pre-generated receipt number");
            Some(PreparedOrder {
                order_id: order_id.to_string(),
                receipt_number,
            })
        } else {
            None
        };

        // 4. Begin write transaction
        let txn = self.store.begin_write()?;

        // Double-check idempotency within transaction
        if self.store.is_command_processed_txn(&txn, &cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command");
            return Ok((CommandResponse::duplicate(cmd.command_id.clone()), vec![]));
        }

        let current_sequence = self.store.counter_txn(&txn, SEQUENCE_COUNTER)?;
        let mut ctx = CommandContext::new(&txn, &self.store, current_sequence);
        let metadata = CommandMetadata {
            command_id: cmd.command_id.clone(),
            operator_id: cmd.operator_id.clone(),
            operator_name: cmd.operator_name.clone(),
            timestamp: cmd.timestamp,
        };

        // 5. Convert to action and execute
        let action = CommandAction::from_command(cmd, prepared)?;
        let events = action.execute(&mut ctx, &metadata)?;

        // 6. Apply events to snapshots
        for event in &events {
            let mut snapshot = ctx.load_or_new(&event.order_id)?;
            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);
            ctx.save_snapshot(snapshot);
        }

        // 7. Persist
        for event in &events {
            self.store
                .append_event_txn(&txn, &event.order_id, event.sequence, event)?;
        }

        let last_sequence = ctx.current_sequence();
        let snapshots = ctx.into_modified_snapshots();
        let mut changes = Vec::with_capacity(snapshots.len() + 1);
        let mut to_release = Vec::new();
        for snapshot in &snapshots {
            self.store
                .put_txn(&txn, Collection::Orders, &snapshot.order_id, snapshot)?;
            changes.push(StoreChange::new(Collection::Orders, &snapshot.order_id));
            if snapshot.is_terminal()
                && let Some(number) = snapshot.table_number
            {
                to_release.push((number, snapshot.order_id.clone()));
            }
        }

        if let OrderCommandPayload::CheckoutCart { .. } = &cmd.payload
            && self
                .store
                .remove_txn(&txn, Collection::Carts, &cmd.operator_id)?
        {
            changes.push(StoreChange::new(Collection::Carts, &cmd.operator_id));
        }

        self.store
            .set_counter_txn(&txn, SEQUENCE_COUNTER, last_sequence)?;
        self.store.mark_command_processed(&txn, &cmd.command_id)?;

        // 8. Commit
        self.store.commit(txn, changes)?;

        tracing::info!(
            command_id = %cmd.command_id,
            command = cmd.payload.name(),
            order_id = %order_id,
            events = events.len(),
            "Command applied"
        );

        // 9. Release tables (best effort, reconcile repairs failures)
        for (number, released_order) in to_release {
            if let Err(e) = self.tables.release_claim(number, &released_order) {
                tracing::warn!(
                    table_number = number,
                    order_id = %released_order,
                    error = %e,
                    "Table release failed, left for reconcile"
                );
            }
        }

        Ok((
            CommandResponse::success(cmd.command_id.clone(), Some(order_id.to_string())),
            events,
        ))
    }

    // ========== Public Query Methods ==========

    pub fn get_order(&self, order_id: &str) -> ManagerResult<Option<OrderSnapshot>> {
        Ok(self.store.get(Collection::Orders, order_id)?)
    }

    /// All orders, newest first
    pub fn list_orders(&self, limit: usize) -> ManagerResult<Vec<OrderSnapshot>> {
        let mut orders = self.all_orders()?;
        sort_by_creation(&mut orders);
        orders.reverse();
        orders.truncate(limit);
        Ok(orders)
    }

    /// Orders that are neither PAID nor CANCELED, oldest first
    pub fn active_orders(&self) -> ManagerResult<Vec<OrderSnapshot>> {
        let mut orders: Vec<_> = self
            .all_orders()?
            .into_iter()
            .filter(|o| !o.is_terminal())
            .collect();
        sort_by_creation(&mut orders);
        Ok(orders)
    }

    /// Orders waiting on the kitchen (NEW / PREPARING with kitchen items), oldest first
    pub fn kitchen_queue(&self) -> ManagerResult<Vec<OrderSnapshot>> {
        let mut orders: Vec<_> = self
            .all_orders()?
            .into_iter()
            .filter(|o| {
                matches!(o.status, OrderStatus::New | OrderStatus::Preparing)
                    && o.has_kitchen_items()
            })
            .collect();
        sort_by_creation(&mut orders);
        Ok(orders)
    }

    /// Finished kitchen orders (READY / PAID), most recently changed first
    pub fn kitchen_history(&self, limit: usize) -> ManagerResult<Vec<OrderSnapshot>> {
        let mut orders: Vec<_> = self
            .all_orders()?
            .into_iter()
            .filter(|o| {
                matches!(o.status, OrderStatus::Ready | OrderStatus::Paid) && o.has_kitchen_items()
            })
            .collect();
        orders.sort_by(|a, b| b.last_sequence.cmp(&a.last_sequence));
        orders.truncate(limit);
        Ok(orders)
    }

    /// READY delivery/pickup orders not yet handed over, oldest first
    pub fn pending_deliveries(&self) -> ManagerResult<Vec<OrderSnapshot>> {
        let mut orders: Vec<_> = self
            .all_orders()?
            .into_iter()
            .filter(OrderSnapshot::awaits_delivery)
            .collect();
        sort_by_creation(&mut orders);
        Ok(orders)
    }

    /// Event stream of one order, ordered by sequence
    pub fn order_events(&self, order_id: &str) -> ManagerResult<Vec<OrderEvent>> {
        Ok(self.store.events(order_id)?)
    }

    pub fn current_sequence(&self) -> ManagerResult<u64> {
        Ok(self.store.counter(SEQUENCE_COUNTER)?)
    }

    /// Rebuild a snapshot from events (for verification)
    pub fn rebuild_order(&self, order_id: &str) -> ManagerResult<OrderSnapshot> {
        let events = self.order_events(order_id)?;
        appliers::replay(order_id, &events)
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    /// Compare the stored snapshot with a replay of its event stream
    ///
    /// Returns false on drift.
    pub fn verify_order(&self, order_id: &str) -> ManagerResult<bool> {
        let stored = self
            .get_order(order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        let rebuilt = self.rebuild_order(order_id)?;

        let consistent = stored.verify_checksum()
            && stored.state_checksum == rebuilt.state_checksum
            && stored.items == rebuilt.items;
        if !consistent {
            tracing::warn!(
                order_id = %order_id,
                stored = %stored.state_checksum,
                rebuilt = %rebuilt.state_checksum,
                "Order snapshot drift detected"
            );
        }
        Ok(consistent)
    }

    fn all_orders(&self) -> ManagerResult<Vec<OrderSnapshot>> {
        Ok(self.store.list(Collection::Orders)?)
    }
}

/// Oldest first; receipt numbers break ties within the same millisecond
fn sort_by_creation(orders: &mut [OrderSnapshot]) {
    orders.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.receipt_number.cmp(&b.receipt_number))
    });
}

#[cfg(test)]
mod tests;

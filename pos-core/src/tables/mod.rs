//! Table registry - dine-in table occupancy
//!
//! A table is occupied iff it holds a live order reference. Occupancy is
//! claimed before the order is written and released after the order
//! reaches a terminal state; both are separate transactions from the order
//! write, so a crash in between leaves a stale claim.
//!
//! Stale claims are healed lazily on `occupy` and by [`TableRegistry::reconcile`]:
//!
//! - reference to a PAID / CANCELED order: stale
//! - reference to an order that does not exist: stale only after the claim
//!   grace period (the window between occupy and the order write)

use crate::auth::{self, permissions};
use crate::store::{Collection, Store, StoreChange, StorageResult};
use redb::WriteTransaction;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Actor, DiningTable, TableStatus};
use shared::order::OrderSnapshot;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Claim grace period default (ms)
pub const DEFAULT_CLAIM_GRACE_MS: i64 = 30_000;

#[derive(Debug, Clone)]
pub struct TableRegistry {
    store: Store,
    claim_grace_ms: i64,
}

impl TableRegistry {
    pub fn new(store: Store, claim_grace_ms: i64) -> Self {
        Self {
            store,
            claim_grace_ms,
        }
    }

    /// Create tables 1..=count when the registry is empty
    pub fn seed_tables(&self, count: u32) -> AppResult<usize> {
        let txn = self.store.begin_write()?;
        let existing: Vec<DiningTable> = self.store.list_txn(&txn, Collection::Tables)?;
        if !existing.is_empty() {
            return Ok(0);
        }

        let mut changes = Vec::with_capacity(count as usize);
        for number in 1..=count {
            let table = DiningTable::new(number);
            self.store
                .put_txn(&txn, Collection::Tables, &table_key(number), &table)?;
            changes.push(StoreChange::new(Collection::Tables, table_key(number)));
        }
        self.store.commit(txn, changes)?;

        tracing::info!(count, "Seeded dining tables");
        Ok(count as usize)
    }

    /// Tables ordered by number
    pub fn list_tables(&self) -> AppResult<Vec<DiningTable>> {
        let mut tables: Vec<DiningTable> = self.store.list(Collection::Tables)?;
        tables.sort_by_key(|t| t.number);
        Ok(tables)
    }

    pub fn get_table(&self, number: u32) -> AppResult<DiningTable> {
        self.store
            .get::<DiningTable>(Collection::Tables, &table_key(number))?
            .ok_or_else(|| table_not_found(number))
    }

    /// Claim a table for an order
    ///
    /// Idempotent for the same order. A stale claim is taken over.
    pub fn occupy(&self, number: u32, order_id: &str) -> AppResult<DiningTable> {
        let txn = self.store.begin_write()?;
        let mut table = self.load_txn(&txn, number)?;

        if table.status == TableStatus::Closed {
            return Err(AppError::with_message(
                ErrorCode::TableClosed,
                format!("Table {number} is closed for service"),
            )
            .with_detail("table_number", number));
        }

        match table.current_order_id.as_deref() {
            Some(current) if current == order_id => return Ok(table),
            Some(current) => {
                let now = shared::util::now_millis();
                if !self.claim_is_stale(&txn, &table, now)? {
                    return Err(AppError::with_message(
                        ErrorCode::TableOccupied,
                        format!("Table {number} is occupied by order {current}"),
                    )
                    .with_detail("table_number", number)
                    .with_detail("order_id", current));
                }
                tracing::warn!(
                    table_number = number,
                    stale_order_id = %current,
                    "Taking over stale table claim"
                );
            }
            None => {}
        }

        table.status = TableStatus::Occupied;
        table.current_order_id = Some(order_id.to_string());
        table.occupied_at = Some(shared::util::now_millis());
        self.store
            .put_txn(&txn, Collection::Tables, &table_key(number), &table)?;
        self.store
            .commit(txn, vec![StoreChange::new(Collection::Tables, table_key(number))])?;

        tracing::info!(table_number = number, order_id = %order_id, "Table occupied");
        Ok(table)
    }

    /// Free a table whose order is terminal or missing
    ///
    /// Releasing a free table is a no-op.
    pub fn release(&self, number: u32) -> AppResult<DiningTable> {
        let txn = self.store.begin_write()?;
        let mut table = self.load_txn(&txn, number)?;

        let Some(order_id) = table.current_order_id.clone() else {
            return Ok(table);
        };
        if let Some(order) =
            self.store
                .get_txn::<OrderSnapshot>(&txn, Collection::Orders, &order_id)?
            && !order.is_terminal()
        {
            return Err(AppError::with_message(
                ErrorCode::TableStillInUse,
                format!("Table {number} still holds live order {order_id}"),
            )
            .with_detail("table_number", number)
            .with_detail("order_id", order_id));
        }

        clear_claim(&mut table);
        self.store
            .put_txn(&txn, Collection::Tables, &table_key(number), &table)?;
        self.store
            .commit(txn, vec![StoreChange::new(Collection::Tables, table_key(number))])?;

        tracing::info!(table_number = number, order_id = %order_id, "Table released");
        Ok(table)
    }

    /// Drop a claim held by a specific order once that order is terminal or
    /// was never written (failed create)
    ///
    /// Leaves the table alone if it no longer references `order_id`.
    pub(crate) fn release_claim(&self, number: u32, order_id: &str) -> AppResult<()> {
        let txn = self.store.begin_write()?;
        let mut table = self.load_txn(&txn, number)?;
        if table.current_order_id.as_deref() != Some(order_id) {
            return Ok(());
        }
        if let Some(order) =
            self.store
                .get_txn::<OrderSnapshot>(&txn, Collection::Orders, order_id)?
            && !order.is_terminal()
        {
            return Ok(());
        }

        clear_claim(&mut table);
        self.store
            .put_txn(&txn, Collection::Tables, &table_key(number), &table)?;
        self.store
            .commit(txn, vec![StoreChange::new(Collection::Tables, table_key(number))])?;
        Ok(())
    }

    /// Close a table for service, or reopen it (admin)
    pub fn set_closed(&self, actor: &Actor, number: u32, closed: bool) -> AppResult<DiningTable> {
        auth::require_permission(actor, permissions::TABLES_MANAGE)?;

        let txn = self.store.begin_write()?;
        let mut table = self.load_txn(&txn, number)?;
        if closed && table.is_occupied() {
            return Err(AppError::with_message(
                ErrorCode::TableOccupied,
                format!("Table {number} is occupied and cannot be closed"),
            )
            .with_detail("table_number", number));
        }

        table.status = match (closed, table.is_occupied()) {
            (true, _) => TableStatus::Closed,
            (false, true) => TableStatus::Occupied,
            (false, false) => TableStatus::Free,
        };
        self.store
            .put_txn(&txn, Collection::Tables, &table_key(number), &table)?;
        self.store
            .commit(txn, vec![StoreChange::new(Collection::Tables, table_key(number))])?;

        tracing::info!(table_number = number, closed, "Table service status changed");
        Ok(table)
    }

    /// Self-healing pass: release every stale claim
    ///
    /// Returns the numbers of the tables that were released.
    pub fn reconcile(&self) -> AppResult<Vec<u32>> {
        let txn = self.store.begin_write()?;
        let tables: Vec<DiningTable> = self.store.list_txn(&txn, Collection::Tables)?;
        let now = shared::util::now_millis();

        let mut released = Vec::new();
        let mut changes = Vec::new();
        for mut table in tables {
            if !table.is_occupied() || !self.claim_is_stale(&txn, &table, now)? {
                continue;
            }
            tracing::warn!(
                table_number = table.number,
                stale_order_id = ?table.current_order_id,
                "Releasing stale table claim"
            );
            clear_claim(&mut table);
            self.store
                .put_txn(&txn, Collection::Tables, &table_key(table.number), &table)?;
            changes.push(StoreChange::new(Collection::Tables, table_key(table.number)));
            released.push(table.number);
        }

        if released.is_empty() {
            // 无变化, 丢弃事务
            return Ok(released);
        }
        self.store.commit(txn, changes)?;
        released.sort_unstable();
        Ok(released)
    }

    /// Run [`reconcile`](Self::reconcile) periodically on the tokio runtime
    pub fn spawn_reconcile_task(&self, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            tracing::info!(interval_secs = every.as_secs(), "Table reconcile task started");
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                match registry.reconcile() {
                    Ok(released) if released.is_empty() => {}
                    Ok(released) => {
                        tracing::info!(tables = ?released, "Reconcile released stale tables")
                    }
                    Err(e) => tracing::error!(error = %e, "Table reconcile failed"),
                }
            }
        })
    }

    fn load_txn(&self, txn: &WriteTransaction, number: u32) -> AppResult<DiningTable> {
        self.store
            .get_txn::<DiningTable>(txn, Collection::Tables, &table_key(number))?
            .ok_or_else(|| table_not_found(number))
    }

    fn claim_is_stale(
        &self,
        txn: &WriteTransaction,
        table: &DiningTable,
        now: i64,
    ) -> StorageResult<bool> {
        let Some(order_id) = table.current_order_id.as_deref() else {
            return Ok(false);
        };
        match self
            .store
            .get_txn::<OrderSnapshot>(txn, Collection::Orders, order_id)?
        {
            Some(order) => Ok(order.is_terminal()),
            None => {
                let claimed_at = table.occupied_at.unwrap_or(0);
                Ok(now - claimed_at > self.claim_grace_ms)
            }
        }
    }
}

fn table_key(number: u32) -> String {
    number.to_string()
}

fn clear_claim(table: &mut DiningTable) {
    table.current_order_id = None;
    table.occupied_at = None;
    if table.status == TableStatus::Occupied {
        table.status = TableStatus::Free;
    }
}

fn table_not_found(number: u32) -> AppError {
    AppError::with_message(ErrorCode::TableNotFound, format!("Table {number} not found"))
        .with_detail("table_number", number)
}

//! redb-based document store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | one per [`Collection`] | document id | JSON document | one table per domain collection |
//! | `events` | `(order_id, sequence)` | `OrderEvent` | Event stream (append-only) |
//! | `processed_commands` | `command_id` | `()` | Idempotency check |
//! | `counters` | name | `u64` | Global sequence, daily order count |
//!
//! Every mutation goes through a single write transaction; redb serialises
//! writers, so a read-check-write inside one transaction cannot race.
//! After a successful commit the touched documents are announced on a
//! broadcast channel ([`Store::subscribe`]).

mod error;

pub use error::{StorageError, StorageResult};

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Table for storing events: key = (order_id, sequence), value = JSON-serialized event
const EVENTS_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("events");

/// Table for tracking processed commands: key = command_id, value = empty (idempotency)
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, ()> =
    TableDefinition::new("processed_commands");

/// Table for counters: key = counter name, value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Change notification channel capacity
const CHANGE_CHANNEL_CAPACITY: usize = 4096;

/// Document collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Categories,
    Orders,
    Tables,
    Sessions,
    Carts,
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Products,
        Collection::Categories,
        Collection::Orders,
        Collection::Tables,
        Collection::Sessions,
        Collection::Carts,
        Collection::Settings,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Categories => "categories",
            Collection::Orders => "orders",
            Collection::Tables => "tables",
            Collection::Sessions => "sessions",
            Collection::Carts => "carts",
            Collection::Settings => "settings",
        }
    }

    fn table(&self) -> TableDefinition<'static, &'static str, &'static [u8]> {
        TableDefinition::new(self.name())
    }
}

/// A committed change to one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub collection: Collection,
    pub key: String,
}

impl StoreChange {
    pub fn new(collection: Collection, key: impl Into<String>) -> Self {
        Self {
            collection,
            key: key.into(),
        }
    }
}

/// Document store backed by redb
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
    change_tx: broadcast::Sender<StoreChange>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("db", &"<redb::Database>")
            .field("subscribers", &self.change_tx.receiver_count())
            .finish()
    }
}

impl Store {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: once `commit()`
    /// returns the data is on disk.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // Create all tables if they don't exist
        let write_txn = db.begin_write()?;
        {
            for collection in Collection::ALL {
                let _ = write_txn.open_table(collection.table())?;
            }
            let _ = write_txn.open_table(EVENTS_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
        }
        write_txn.commit()?;

        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            db: Arc::new(db),
            change_tx,
        })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Commit a write transaction and announce the changed documents
    pub fn commit(&self, txn: WriteTransaction, changes: Vec<StoreChange>) -> StorageResult<()> {
        txn.commit()?;
        for change in changes {
            // No receivers is fine, the cache may not be running
            let _ = self.change_tx.send(change);
        }
        Ok(())
    }

    /// Subscribe to committed document changes
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.change_tx.subscribe()
    }

    // ========== Document Operations ==========

    /// Get a document (read-only)
    pub fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(collection.table())?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a document (within transaction)
    pub fn get_txn<T: DeserializeOwned>(
        &self,
        txn: &WriteTransaction,
        collection: Collection,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let table = txn.open_table(collection.table())?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or replace a document
    pub fn put_txn<T: Serialize>(
        &self,
        txn: &WriteTransaction,
        collection: Collection,
        key: &str,
        value: &T,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(collection.table())?;
        let bytes = serde_json::to_vec(value)?;
        table.insert(key, bytes.as_slice())?;
        Ok(())
    }

    /// Remove a document, returns whether it existed
    pub fn remove_txn(
        &self,
        txn: &WriteTransaction,
        collection: Collection,
        key: &str,
    ) -> StorageResult<bool> {
        let mut table = txn.open_table(collection.table())?;
        let existed = table.remove(key)?.is_some();
        Ok(existed)
    }

    /// All documents of a collection, in key order
    pub fn list<T: DeserializeOwned>(&self, collection: Collection) -> StorageResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(collection.table())?;
        let mut docs = Vec::with_capacity(table.len()? as usize);
        for result in table.iter()? {
            let (_key, value) = result?;
            docs.push(serde_json::from_slice(value.value())?);
        }
        Ok(docs)
    }

    /// All documents of a collection (within transaction)
    pub fn list_txn<T: DeserializeOwned>(
        &self,
        txn: &WriteTransaction,
        collection: Collection,
    ) -> StorageResult<Vec<T>> {
        let table = txn.open_table(collection.table())?;
        let mut docs = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            docs.push(serde_json::from_slice(value.value())?);
        }
        Ok(docs)
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: Collection) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(collection.table())?;
        Ok(table.len()?)
    }

    // ========== Counter Operations ==========

    /// Current counter value (read-only)
    pub fn counter(&self, name: &str) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(table.get(name)?.map(|g| g.value()).unwrap_or(0))
    }

    /// Current counter value (within transaction)
    pub fn counter_txn(&self, txn: &WriteTransaction, name: &str) -> StorageResult<u64> {
        let table = txn.open_table(COUNTERS_TABLE)?;
        Ok(table.get(name)?.map(|g| g.value()).unwrap_or(0))
    }

    /// Set counter value (within transaction)
    pub fn set_counter_txn(
        &self,
        txn: &WriteTransaction,
        name: &str,
        value: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        table.insert(name, value)?;
        Ok(())
    }

    /// Increment a counter in its own transaction (crash-safe)
    ///
    /// Must not be called while another write transaction is open on the
    /// same thread: redb does not allow nested write transactions.
    pub fn next_counter(&self, name: &str) -> StorageResult<u64> {
        let txn = self.db.begin_write()?;
        let next = self.counter_txn(&txn, name)? + 1;
        self.set_counter_txn(&txn, name, next)?;
        txn.commit()?;
        Ok(next)
    }

    // ========== Idempotency ==========

    /// Check if a command has been processed
    pub fn is_command_processed(&self, command_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Check if a command has been processed (within transaction)
    pub fn is_command_processed_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Mark a command as processed
    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, ())?;
        Ok(())
    }

    // ========== Event Operations ==========

    /// Append an event to a stream
    pub fn append_event_txn<T: Serialize>(
        &self,
        txn: &WriteTransaction,
        stream: &str,
        sequence: u64,
        event: &T,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(EVENTS_TABLE)?;
        let value = serde_json::to_vec(event)?;
        table.insert((stream, sequence), value.as_slice())?;
        Ok(())
    }

    /// All events of a stream, ordered by sequence
    pub fn events<T: DeserializeOwned>(&self, stream: &str) -> StorageResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.range((stream, 0u64)..=(stream, u64::MAX))? {
            let (_key, value) = result?;
            events.push(serde_json::from_slice(value.value())?);
        }
        Ok(events)
    }
}

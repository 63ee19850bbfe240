//! Live read cache (实时快照缓存)
//!
//! Holds in-memory copies of orders, tables, products and the open cashier
//! session. [`LiveCache::spawn`] subscribes to [`Store::subscribe`] and
//! replaces the cached copy of every document a commit touched; readers never
//! hit the database.
//!
//! A lagged subscriber (channel overflow) falls back to a full reload.

use crate::catalog::sort_products;
use crate::store::{Collection, Store, StoreChange, StorageResult};
use parking_lot::RwLock;
use shared::models::{CashierSession, DiningTable, Product};
use shared::order::OrderSnapshot;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct LiveCache {
    store: Store,
    orders: Arc<RwLock<HashMap<String, OrderSnapshot>>>,
    /// number → table
    tables: Arc<RwLock<BTreeMap<u32, DiningTable>>>,
    products: Arc<RwLock<HashMap<String, Product>>>,
    session: Arc<RwLock<Option<CashierSession>>>,
}

impl std::fmt::Debug for LiveCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveCache")
            .field("orders", &self.orders.read().len())
            .field("tables", &self.tables.read().len())
            .field("products", &self.products.read().len())
            .field("session", &self.session.read().as_ref().map(|s| s.id.clone()))
            .finish()
    }
}

impl LiveCache {
    /// Empty cache; call [`warmup`](Self::warmup) or [`spawn`](Self::spawn)
    pub fn new(store: Store) -> Self {
        Self {
            store,
            orders: Arc::new(RwLock::new(HashMap::new())),
            tables: Arc::new(RwLock::new(BTreeMap::new())),
            products: Arc::new(RwLock::new(HashMap::new())),
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Reload every cached collection from the store
    pub fn warmup(&self) -> StorageResult<()> {
        let orders: Vec<OrderSnapshot> = self.store.list(Collection::Orders)?;
        let tables: Vec<DiningTable> = self.store.list(Collection::Tables)?;
        let products: Vec<Product> = self.store.list(Collection::Products)?;
        let sessions: Vec<CashierSession> = self.store.list(Collection::Sessions)?;

        *self.orders.write() = orders
            .into_iter()
            .map(|o| (o.order_id.clone(), o))
            .collect();
        *self.tables.write() = tables.into_iter().map(|t| (t.number, t)).collect();
        *self.products.write() = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        *self.session.write() = sessions.into_iter().find(CashierSession::is_open);

        tracing::debug!(
            orders = self.orders.read().len(),
            tables = self.tables.read().len(),
            products = self.products.read().len(),
            "Live cache loaded"
        );
        Ok(())
    }

    /// Replace the cached copy of one changed document
    pub fn refresh(&self, change: &StoreChange) -> StorageResult<()> {
        match change.collection {
            Collection::Orders => {
                let order = self.store.get::<OrderSnapshot>(Collection::Orders, &change.key)?;
                let mut orders = self.orders.write();
                match order {
                    Some(order) => orders.insert(change.key.clone(), order),
                    None => orders.remove(&change.key),
                };
            }
            Collection::Tables => {
                let table = self.store.get::<DiningTable>(Collection::Tables, &change.key)?;
                let mut tables = self.tables.write();
                match table {
                    Some(table) => {
                        tables.insert(table.number, table);
                    }
                    None => {
                        if let Ok(number) = change.key.parse::<u32>() {
                            tables.remove(&number);
                        }
                    }
                }
            }
            Collection::Products => {
                let product = self.store.get::<Product>(Collection::Products, &change.key)?;
                let mut products = self.products.write();
                match product {
                    Some(product) => products.insert(change.key.clone(), product),
                    None => products.remove(&change.key),
                };
            }
            Collection::Sessions => {
                // 只缓存当前开着的班次
                let session = self
                    .store
                    .get::<CashierSession>(Collection::Sessions, &change.key)?;
                let mut current = self.session.write();
                match session {
                    Some(s) if s.is_open() => *current = Some(s),
                    _ => {
                        if current.as_ref().is_some_and(|c| c.id == change.key) {
                            *current = None;
                        }
                    }
                }
            }
            Collection::Categories | Collection::Carts | Collection::Settings => {}
        }
        Ok(())
    }

    /// Subscribe to store changes and keep the cache current
    ///
    /// Subscribes before the initial load, so no commit between the two is
    /// missed.
    pub fn spawn(&self) -> JoinHandle<()> {
        let cache = self.clone();
        let mut rx = self.store.subscribe();
        if let Err(e) = cache.warmup() {
            tracing::error!(error = %e, "Live cache warmup failed");
        }
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        if let Err(e) = cache.refresh(&change) {
                            tracing::error!(
                                collection = change.collection.name(),
                                key = %change.key,
                                error = %e,
                                "Live cache refresh failed"
                            );
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Live cache lagged, reloading");
                        if let Err(e) = cache.warmup() {
                            tracing::error!(error = %e, "Live cache reload failed");
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("Live cache task stopped");
        })
    }

    // ========== Reads ==========

    /// Orders, newest first
    pub fn list_orders(&self, limit: usize) -> Vec<OrderSnapshot> {
        let mut orders: Vec<OrderSnapshot> = self.orders.read().values().cloned().collect();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.receipt_number.cmp(&a.receipt_number))
        });
        orders.truncate(limit);
        orders
    }

    pub fn get_order(&self, order_id: &str) -> Option<OrderSnapshot> {
        self.orders.read().get(order_id).cloned()
    }

    pub fn current_session(&self) -> Option<CashierSession> {
        self.session.read().clone()
    }

    /// Tables by number
    pub fn list_tables(&self) -> Vec<DiningTable> {
        self.tables.read().values().cloned().collect()
    }

    /// Active products, menu order
    pub fn list_products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .read()
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        sort_products(&mut products);
        products
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogService;
    use crate::sessions::SessionManager;
    use crate::tables::{DEFAULT_CLAIM_GRACE_MS, TableRegistry};
    use rust_decimal::Decimal;
    use shared::models::{Actor, Role, TableStatus};
    use std::time::Duration;

    fn admin() -> Actor {
        Actor::new("admin-1", "Admin", Role::Admin)
    }

    /// Yield to the cache task until `check` holds
    async fn eventually(check: impl Fn() -> bool) {
        for _ in 0..100 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("cache did not converge");
    }

    #[test]
    fn test_warmup_and_refresh() {
        let store = Store::open_in_memory().unwrap();
        CatalogService::new(store.clone()).seed_products().unwrap();
        let tables = TableRegistry::new(store.clone(), DEFAULT_CLAIM_GRACE_MS);
        tables.seed_tables(3).unwrap();

        let cache = LiveCache::new(store.clone());
        cache.warmup().unwrap();
        assert_eq!(cache.list_tables().len(), 3);
        assert_eq!(cache.list_products().len(), 8);

        // 不经过订阅，手动刷新
        tables.set_closed(&admin(), 2, true).unwrap();
        assert_eq!(cache.list_tables()[1].status, TableStatus::Free);
        cache
            .refresh(&StoreChange::new(Collection::Tables, "2"))
            .unwrap();
        assert_eq!(cache.list_tables()[1].status, TableStatus::Closed);
    }

    #[tokio::test]
    async fn test_follows_store_changes() {
        let store = Store::open_in_memory().unwrap();
        let cache = LiveCache::new(store.clone());
        let handle = cache.spawn();
        assert!(cache.current_session().is_none());

        let sessions = SessionManager::new(store.clone());
        let opened = sessions.open(&admin(), Decimal::from(100)).unwrap();
        eventually(|| cache.current_session().is_some_and(|s| s.id == opened.id)).await;

        sessions.close(&admin(), None, None).unwrap();
        eventually(|| cache.current_session().is_none()).await;

        let catalog = CatalogService::new(store.clone());
        catalog.seed_products().unwrap();
        eventually(|| cache.list_products().len() == 8).await;
        catalog.deactivate_product(&admin(), "coca-lata").unwrap();
        eventually(|| cache.list_products().len() == 7).await;

        handle.abort();
    }
}

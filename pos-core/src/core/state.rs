use crate::auth::{self, permissions};
use crate::cache::LiveCache;
use crate::carts::CartService;
use crate::catalog::CatalogService;
use crate::core::Config;
use crate::orders::OrdersManager;
use crate::receipts::{OrderReceipt, SessionReport};
use crate::sessions::SessionManager;
use crate::settings::SettingsService;
use crate::store::{Collection, Store};
use crate::tables::TableRegistry;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::Actor;
use shared::order::OrderSnapshot;
use std::time::Duration;
use tokio::task::JoinHandle;

/// POS 核心状态 - 持有所有服务的共享引用
///
/// 各服务内部只持有 [`Store`] 的克隆 (Arc)，整体 clone 成本很低。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | store | redb 文档库 |
/// | catalog | 菜单 |
/// | tables | 桌台占用 |
/// | sessions | 收银班次 |
/// | orders | 订单引擎 |
/// | cache | 实时快照缓存 |
/// | carts | 顾客购物车 |
/// | settings | 店铺设置 |
#[derive(Clone, Debug)]
pub struct PosState {
    pub config: Config,
    pub store: Store,
    pub catalog: CatalogService,
    pub tables: TableRegistry,
    pub sessions: SessionManager,
    pub orders: OrdersManager,
    pub cache: LiveCache,
    pub carts: CartService,
    pub settings: SettingsService,
}

impl PosState {
    /// 初始化核心状态
    ///
    /// 按顺序：
    /// 0. 日志
    /// 1. 工作目录
    /// 2. 数据库 (work_dir/db_file)
    /// 3. 首次启动的菜单与桌台
    /// 4. 各服务，以及一次桌台自愈
    pub fn initialize(config: &Config) -> AppResult<Self> {
        config.init_logger();
        std::fs::create_dir_all(&config.work_dir).map_err(|e| {
            AppError::with_message(
                ErrorCode::StorageUnavailable,
                format!("Failed to create work directory {}: {e}", config.work_dir),
            )
        })?;

        let db_path = config.db_path();
        let store = Store::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Database opened");

        let catalog = CatalogService::new(store.clone());
        catalog.seed_products()?;

        let tables = TableRegistry::new(store.clone(), config.table_claim_grace_ms);
        tables.seed_tables(config.table_count)?;
        let released = tables.reconcile()?;
        if !released.is_empty() {
            tracing::warn!(tables = ?released, "Released stale table claims at startup");
        }

        let orders = OrdersManager::new(store.clone(), tables.clone(), config.timezone);

        Ok(Self {
            config: config.clone(),
            catalog,
            tables,
            sessions: SessionManager::new(store.clone()),
            orders,
            cache: LiveCache::new(store.clone()),
            carts: CartService::new(store.clone()),
            settings: SettingsService::new(store.clone()),
            store,
        })
    }

    /// 启动后台任务 (需要 tokio 运行时)
    ///
    /// - 实时缓存订阅
    /// - 桌台定期自愈
    pub fn start_background_tasks(&self) -> Vec<JoinHandle<()>> {
        vec![
            self.cache.spawn(),
            self.tables
                .spawn_reconcile_task(Duration::from_secs(self.config.reconcile_interval_secs)),
        ]
    }

    /// 最近订单 (来自缓存，条数取配置)
    pub fn recent_orders(&self) -> Vec<OrderSnapshot> {
        self.cache.list_orders(self.config.order_list_limit)
    }

    /// 订单小票数据
    pub fn order_receipt(&self, order_id: &str) -> AppResult<OrderReceipt> {
        let order = self
            .orders
            .get_order(order_id)?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::OrderNotFound,
                    format!("Order not found: {order_id}"),
                )
                .with_detail("order_id", order_id)
            })?;
        Ok(OrderReceipt::build(&order, &self.settings.get()?))
    }

    /// 交班报表数据
    pub fn session_report(&self, actor: &Actor, session_id: &str) -> AppResult<SessionReport> {
        auth::require_permission(actor, permissions::REPORTS_VIEW)?;
        let session = self.sessions.get(session_id)?;
        let orders: Vec<OrderSnapshot> = self.store.list(Collection::Orders)?;
        Ok(SessionReport::build(
            &session,
            &orders,
            &self.settings.get()?,
            shared::util::now_millis(),
        ))
    }
}

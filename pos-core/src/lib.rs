//! POS Core - 柜台/桌台点餐系统的订单与收银班次核心
//!
//! # 架构概述
//!
//! - **订单引擎** (`orders`): 命令 → 事件 → 快照，单个 redb 写事务内完成
//! - **桌台** (`tables`): 占桌、释放、自愈
//! - **收银班次** (`sessions`): 开/关班，按支付方式汇总
//! - **菜单** (`catalog`): 商品与分类
//! - **报表** (`reports`): 纯函数聚合
//! - **缓存** (`cache`): 订阅 store 变更的实时快照
//!
//! # 模块结构
//!
//! ```text
//! pos-core/src/
//! ├── core/          # 配置、状态
//! ├── auth/          # 角色权限
//! ├── store/         # redb 文档库
//! ├── catalog/       # 菜单
//! ├── tables/        # 桌台
//! ├── sessions/      # 收银班次
//! ├── orders/        # 订单引擎
//! ├── carts/         # 顾客购物车
//! ├── settings/      # 店铺设置
//! ├── cache/         # 实时缓存
//! ├── reports/       # 报表
//! ├── receipts/      # 小票数据
//! └── utils/         # 日志、时间、校验
//! ```

pub mod auth;
pub mod cache;
pub mod carts;
pub mod catalog;
pub mod core;
pub mod orders;
pub mod receipts;
pub mod reports;
pub mod sessions;
pub mod settings;
pub mod store;
pub mod tables;
pub mod utils;

// Re-export 公共类型
pub use cache::LiveCache;
pub use core::{Config, PosState};
pub use orders::OrdersManager;
pub use store::{Store, StoreChange};

// Re-export unified error types from shared
pub use shared::error::{AppError, AppResult, ErrorCode, ErrorKind};

pub use utils::logger::{init_logger, init_logger_with_file};

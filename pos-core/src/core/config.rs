use crate::tables::DEFAULT_CLAIM_GRACE_MS;
use crate::utils::time::parse_timezone;
use chrono_tz::Tz;
use std::path::PathBuf;

/// POS 核心配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | DB_FILE | pos.redb | 数据库文件名 (相对 WORK_DIR) |
/// | TIMEZONE | America/Sao_Paulo | 业务时区 (日报、单号日期) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 日志目录，未设置时只输出到 stdout |
/// | TABLE_COUNT | 12 | 首次启动时创建的桌台数 |
/// | TABLE_CLAIM_GRACE_MS | 30000 | 占桌后等待订单写入的宽限期 |
/// | RECONCILE_INTERVAL_SECS | 60 | 桌台自愈任务间隔 |
/// | ORDER_LIST_LIMIT | 100 | 订单列表默认条数 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/srv/pos TIMEZONE=America/Recife cargo test
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub db_file: String,
    pub timezone: Tz,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub table_count: u32,
    pub table_claim_grace_ms: i64,
    pub reconcile_interval_secs: u64,
    pub order_list_limit: usize,
}

impl Config {
    /// 从环境变量加载配置，未设置的项使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            db_file: std::env::var("DB_FILE").unwrap_or_else(|_| "pos.redb".into()),
            timezone: parse_timezone(
                &std::env::var("TIMEZONE").unwrap_or_else(|_| "America/Sao_Paulo".into()),
            ),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            table_count: std::env::var("TABLE_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(12),
            table_claim_grace_ms: std::env::var("TABLE_CLAIM_GRACE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CLAIM_GRACE_MS),
            reconcile_interval_secs: std::env::var("RECONCILE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            order_list_limit: std::env::var("ORDER_LIST_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
        }
    }

    /// 读取 `.env` (如果存在) 后再从环境变量加载
    pub fn load() -> Self {
        if let Err(e) = dotenv::dotenv() {
            tracing::debug!(error = %e, "No .env file loaded");
        }
        Self::from_env()
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, table_count: u32) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.table_count = table_count;
        config
    }

    /// 按配置初始化日志 (LOG_LEVEL / LOG_DIR)
    pub fn init_logger(&self) {
        crate::utils::logger::init_logger_with_file(Some(&self.log_level), self.log_dir.as_deref());
    }

    /// 数据库文件完整路径
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.db_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

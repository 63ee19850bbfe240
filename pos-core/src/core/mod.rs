//! 核心模块 - 配置与状态
//!
//! - [`Config`] - 环境变量配置
//! - [`PosState`] - 所有服务的共享句柄

pub mod config;
pub mod state;

pub use config::Config;
pub use state::PosState;

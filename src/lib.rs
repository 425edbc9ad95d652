//! Service Pulse - 可嵌入的服务健康检测注册与调度库
//!
//! 这是一个用Rust编写的健康检测核心库，支持：
//! - 具名探测的注册、注销与周期调度
//! - 失败连击（连续失败次数/首次失败时间）记录
//! - 检测生命周期与聚合结果的监听器分发
//! - HTTP/DNS/TCP/自定义探测实现
//! - JSON健康状态HTTP端点

pub mod checks;
pub mod error;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod web;

// 重新导出主要类型
pub use error::{ProbeError, RegistryError};
pub use health::{
    Check, CheckConfig, CheckFailure, CheckListener, CheckResult, HealthListener, HealthRegistry,
};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

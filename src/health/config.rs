//! 检测调度配置模块
//!
//! 定义注册表级默认值与按检测覆盖项，以及两者的叠加解析

use std::time::Duration;

/// 注册表级调度默认值
///
/// 执行周期默认为零，表示必须由注册表默认值或按检测
/// 覆盖项显式给出；注册时解析出的周期必须严格为正。
#[derive(Debug, Clone)]
pub struct CheckDefaults {
    /// 两次执行之间的周期
    pub execution_period: Duration,
    /// 首次执行前的延迟
    pub initial_delay: Duration,
    /// 首次执行前是否视为健康
    pub initially_passing: bool,
}

impl Default for CheckDefaults {
    fn default() -> Self {
        Self {
            execution_period: Duration::ZERO,
            initial_delay: Duration::ZERO,
            initially_passing: false,
        }
    }
}

/// 按检测覆盖项
///
/// 未设置的字段继承注册表默认值；执行超时仅存在于
/// 检测层，默认为不限制。
#[derive(Debug, Clone, Default)]
pub struct CheckConfig {
    execution_period: Option<Duration>,
    initial_delay: Option<Duration>,
    initially_passing: Option<bool>,
    execution_timeout: Option<Duration>,
}

impl CheckConfig {
    /// 创建空覆盖项，全部继承默认值
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置执行周期
    pub fn with_execution_period(mut self, period: Duration) -> Self {
        self.execution_period = Some(period);
        self
    }

    /// 设置首次执行延迟
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// 设置首次执行前是否视为健康
    pub fn with_initially_passing(mut self, passing: bool) -> Self {
        self.initially_passing = Some(passing);
        self
    }

    /// 设置单次执行超时，零表示不限制
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = Some(timeout);
        self
    }

    /// 将覆盖项叠加到注册表默认值上
    pub(crate) fn resolve(&self, defaults: &CheckDefaults) -> ResolvedConfig {
        ResolvedConfig {
            execution_period: self.execution_period.unwrap_or(defaults.execution_period),
            initial_delay: self.initial_delay.unwrap_or(defaults.initial_delay),
            initially_passing: self.initially_passing.unwrap_or(defaults.initially_passing),
            execution_timeout: self.execution_timeout.unwrap_or(Duration::ZERO),
        }
    }
}

/// 叠加后的完整调度参数
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedConfig {
    pub(crate) execution_period: Duration,
    pub(crate) initial_delay: Duration,
    pub(crate) initially_passing: bool,
    pub(crate) execution_timeout: Duration,
}

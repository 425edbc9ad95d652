//! 健康检测契约
//!
//! 定义调度器消费的探测接口

use async_trait::async_trait;
use serde_json::Value;

/// 健康检测trait，定义探测接口
///
/// 探测以 `Ok` 表示健康（可附带详情），以 `Err` 表示不健康。
/// 调度器通过 `tokio::time::timeout` 约束执行时间，超时即丢弃
/// 探测future，实现方应保证future可随时被取消。
#[async_trait]
pub trait Check: Send + Sync {
    /// 检测的稳定标识，注册时要求非空
    ///
    /// 建议仅使用字母数字、点、连字符和下划线，
    /// 以便直接用作下游指标标签。
    fn name(&self) -> &str;

    /// 执行一次探测
    ///
    /// # 返回
    /// * `Ok(details)` - 探测成功，附带可选详情
    /// * `Err(failure)` - 探测失败，携带原因与可选诊断详情
    async fn execute(&self) -> Result<Option<Value>, CheckFailure>;
}

/// 探测失败载体
///
/// 失败原因以 `anyhow::Error` 保留完整错误链；
/// 详情字段供失败时的诊断信息使用。
#[derive(Debug)]
pub struct CheckFailure {
    /// 失败时仍可返回的诊断详情
    pub details: Option<Value>,
    /// 失败原因
    pub error: anyhow::Error,
}

impl CheckFailure {
    /// 以给定错误构建失败载体
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        CheckFailure {
            details: None,
            error: error.into(),
        }
    }

    /// 以纯文本消息构建失败载体
    pub fn msg(message: impl std::fmt::Display) -> Self {
        CheckFailure {
            details: None,
            error: anyhow::anyhow!("{message}"),
        }
    }

    /// 附加诊断详情
    pub fn with_details(mut self, details: impl Into<Value>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<anyhow::Error> for CheckFailure {
    fn from(error: anyhow::Error) -> Self {
        CheckFailure::new(error)
    }
}

impl std::fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

//! 检测任务执行模块
//!
//! 封装单个已注册检测的一次执行：计时、超时约束与panic捕获

use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::check::Check;

/// 单次执行的产出
#[derive(Debug)]
pub(crate) struct Execution {
    /// 探测返回的详情
    pub(crate) details: Option<Value>,
    /// 执行耗时
    pub(crate) duration: Duration,
    /// 失败原因；成功时为 `None`
    pub(crate) error: Option<anyhow::Error>,
}

/// 调度工作协程持有的检测任务
///
/// 与注册表内的停止信号发送端成对出现，生命周期
/// 从注册开始到注销清理为止。
pub(crate) struct CheckTask {
    pub(crate) check: Arc<dyn Check>,
    /// 单次执行超时；零表示不限制
    pub(crate) timeout: Duration,
}

impl CheckTask {
    /// 执行一次探测
    ///
    /// 超时配置为正时以 `tokio::time::timeout` 约束执行，
    /// 超时即丢弃探测future并产出错误结果。探测panic被
    /// 捕获并转为错误结果，调度不受影响。
    pub(crate) async fn execute(&self) -> Execution {
        let started = Instant::now();
        let probe = AssertUnwindSafe(self.check.execute()).catch_unwind();

        let outcome = if self.timeout.is_zero() {
            probe.await
        } else {
            match tokio::time::timeout(self.timeout, probe).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return Execution {
                        details: None,
                        duration: started.elapsed(),
                        error: Some(anyhow::anyhow!(
                            "execution timed out after {:?}",
                            self.timeout
                        )),
                    }
                }
            }
        };

        let (details, error) = match outcome {
            Ok(Ok(details)) => (details, None),
            Ok(Err(failure)) => (failure.details, Some(failure.error)),
            Err(panic) => (
                None,
                Some(anyhow::anyhow!("check panicked: {}", panic_message(&panic))),
            ),
        };

        Execution {
            details,
            duration: started.elapsed(),
            error,
        }
    }
}

/// 提取panic载荷中的文本消息
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! 自定义函数探测
//!
//! 只需要一个异步函数时的最简检测实现，其余内置探测
//! 也基于它组合

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use crate::health::{Check, CheckFailure};

type CheckFn =
    Box<dyn Fn() -> BoxFuture<'static, Result<Option<Value>, CheckFailure>> + Send + Sync>;

/// 闭包驱动的检测
pub struct CustomCheck {
    name: String,
    check_fn: CheckFn,
}

impl CustomCheck {
    /// 创建自定义检测
    ///
    /// # 参数
    /// * `name` - 检测名称
    /// * `check_fn` - 每次执行调用的异步函数
    pub fn new<F, Fut>(name: impl Into<String>, check_fn: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Option<Value>, CheckFailure>> + Send + 'static,
    {
        CustomCheck {
            name: name.into(),
            check_fn: Box::new(move || check_fn().boxed()),
        }
    }
}

#[async_trait]
impl Check for CustomCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<Option<Value>, CheckFailure> {
        (self.check_fn)().await
    }
}

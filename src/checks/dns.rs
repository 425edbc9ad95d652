//! DNS解析探测
//!
//! 校验目标名称可解析出足够数量的地址

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

use crate::health::{Check, CheckFailure};

/// 解析函数：返回解析出的结果数量
pub type LookupFn =
    Arc<dyn Fn(String) -> BoxFuture<'static, anyhow::Result<usize>> + Send + Sync>;

/// 基于可插拔解析函数的检测
///
/// 检测名称固定为 `resolve.<目标>`。
pub struct ResolveCheck {
    name: String,
    resolve_this: String,
    min_required_results: usize,
    lookup: LookupFn,
}

impl ResolveCheck {
    /// 创建解析检测
    ///
    /// # 参数
    /// * `lookup` - 解析函数
    /// * `resolve_this` - 待解析的目标
    /// * `min_required_results` - 视为健康所需的最少结果数
    pub fn new(lookup: LookupFn, resolve_this: impl Into<String>, min_required_results: usize) -> Self {
        let resolve_this = resolve_this.into();
        ResolveCheck {
            name: format!("resolve.{resolve_this}"),
            resolve_this,
            min_required_results,
            lookup,
        }
    }
}

#[async_trait]
impl Check for ResolveCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<Option<Value>, CheckFailure> {
        match (self.lookup)(self.resolve_this.clone()).await {
            Ok(resolved_count) => {
                let details = Value::String(format!("[{resolved_count}] ips were resolved"));
                if resolved_count < self.min_required_results {
                    Err(CheckFailure::msg(format!(
                        "[{}] lookup returned {} results, but requires at least {}",
                        self.resolve_this, resolved_count, self.min_required_results
                    ))
                    .with_details(details))
                } else {
                    Ok(Some(details))
                }
            }
            Err(error) => Err(CheckFailure::new(error)
                .with_details(Value::String("[0] ips were resolved".to_string()))),
        }
    }
}

/// 创建主机地址解析检测，使用系统解析器
pub fn host_resolve_check(host: impl Into<String>, min_required_results: usize) -> ResolveCheck {
    let lookup: LookupFn = Arc::new(|host: String| {
        Box::pin(async move {
            let addrs = tokio::net::lookup_host(format!("{host}:0")).await?;
            Ok(addrs.count())
        })
    });
    ResolveCheck::new(lookup, host, min_required_results)
}

//! 存活探测
//!
//! 面向"资源仍然存活"类检测：TCP拨号、数据库ping等

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::health::{Check, CheckFailure};

/// 存活探测trait
///
/// 典型实现为TCP拨号或数据库连接ping。
#[async_trait]
pub trait Pinger: Send + Sync {
    /// 执行一次ping
    async fn ping(&self) -> anyhow::Result<()>;
}

/// 包装 [`Pinger`] 的检测
pub struct PingCheck {
    name: String,
    pinger: Arc<dyn Pinger>,
}

impl PingCheck {
    /// 创建存活检测
    pub fn new(name: impl Into<String>, pinger: impl Pinger + 'static) -> Self {
        PingCheck {
            name: name.into(),
            pinger: Arc::new(pinger),
        }
    }
}

#[async_trait]
impl Check for PingCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<Option<Value>, CheckFailure> {
        self.pinger.ping().await.map_err(CheckFailure::new)?;
        Ok(None)
    }
}

/// TCP拨号探测器
///
/// 拨通即视为存活，连接立刻关闭。
pub struct DialPinger {
    address: String,
}

impl DialPinger {
    /// 创建指向目标地址的拨号探测器
    ///
    /// # 参数
    /// * `address` - `host:port` 形式的目标地址
    pub fn new(address: impl Into<String>) -> Self {
        DialPinger {
            address: address.into(),
        }
    }
}

#[async_trait]
impl Pinger for DialPinger {
    async fn ping(&self) -> anyhow::Result<()> {
        let stream = tokio::net::TcpStream::connect(&self.address).await?;
        drop(stream);
        Ok(())
    }
}

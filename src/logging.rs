//! 日志系统模块
//!
//! 提供面向嵌入方的结构化日志初始化

use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 日志配置结构
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 日志文件路径（可选）
    pub file_path: Option<PathBuf>,
    /// 是否输出到控制台
    pub console: bool,
    /// 是否使用JSON格式
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file_path: None,
            console: true,
            json_format: false,
        }
    }
}

/// 日志系统管理器
pub struct LoggingSystem {
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// # 参数
    /// * `config` - 日志配置
    ///
    /// # 返回
    /// * `Result<LoggingSystem, anyhow::Error>` - 初始化结果
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        // 将 log crate 的日志转发到 tracing；重复初始化时忽略
        LogTracer::init().ok();

        let env_filter = EnvFilter::from_default_env()
            .add_directive(Self::convert_level_to_directive(config.level));

        let fmt_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .boxed()
        } else {
            fmt::layer()
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_ansi(true)
                .boxed()
        };

        let result = if config.console || config.file_path.is_none() {
            registry().with(env_filter).with(fmt_layer).try_init()
        } else {
            let file = std::fs::File::create(config.file_path.as_ref().unwrap())?;
            let file_layer = fmt::layer().with_writer(Arc::new(file)).with_ansi(false);
            registry().with(env_filter).with(file_layer).try_init()
        };

        if let Err(e) = result {
            tracing::warn!("日志系统可能已经初始化: {}", e);
        }

        tracing::debug!("日志系统初始化完成: {:?}", config);
        Ok(Self { config })
    }

    /// 获取当前日志配置
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// 将 log::LevelFilter 转换为 tracing 的指令
    fn convert_level_to_directive(level: LevelFilter) -> tracing_subscriber::filter::Directive {
        use tracing_subscriber::filter::Directive;
        match level {
            LevelFilter::Off => "off".parse().unwrap(),
            LevelFilter::Error => Directive::from(tracing::Level::ERROR),
            LevelFilter::Warn => Directive::from(tracing::Level::WARN),
            LevelFilter::Info => Directive::from(tracing::Level::INFO),
            LevelFilter::Debug => Directive::from(tracing::Level::DEBUG),
            LevelFilter::Trace => Directive::from(tracing::Level::TRACE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.level, LevelFilter::Info);
        assert!(config.console);
        assert!(!config.json_format);
        assert!(config.file_path.is_none());
    }

    #[test]
    fn test_setup_logging_is_idempotent() {
        let first = LoggingSystem::setup_logging(LogConfig::default());
        assert!(first.is_ok());

        // 再次初始化不报错，仅记录警告
        let second = LoggingSystem::setup_logging(LogConfig {
            level: LevelFilter::Debug,
            ..Default::default()
        });
        assert!(second.is_ok());
        assert_eq!(second.unwrap().config().level, LevelFilter::Debug);
    }
}

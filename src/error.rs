//! 错误处理模块
//!
//! 定义注册与探测构建的统一错误类型

use thiserror::Error;

/// 检测注册错误类型
///
/// 注册是同步校验的：任一错误返回时不会产生部分注册。
#[derive(Error, Debug)]
pub enum RegistryError {
    /// 检测名称为空
    #[error("检测名称不能为空")]
    EmptyName,

    /// 执行周期未设置或为零
    #[error("检测 {name} 的执行周期必须大于零")]
    InvalidPeriod { name: String },

    /// 同名检测已注册
    #[error("检测 {name} 已注册，需先注销")]
    DuplicateName { name: String },
}

/// 探测器构建错误类型
#[derive(Error, Debug)]
pub enum ProbeError {
    /// 检测名称为空
    #[error("检测名称不能为空")]
    EmptyName,

    /// URL为空
    #[error("URL不能为空")]
    EmptyUrl,

    /// URL解析失败
    #[error("URL解析失败: {0}")]
    InvalidUrl(String),

    /// HTTP方法无效
    #[error("无效的HTTP方法: {0}")]
    InvalidMethod(String),

    /// 期望状态码非法
    #[error("无效的期望状态码: {0}")]
    InvalidStatusCode(u16),

    /// HTTP客户端构建失败
    #[error("HTTP客户端构建失败: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, RegistryError>;

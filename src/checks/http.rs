//! HTTP可达性探测
//!
//! 校验目标URL可访问且响应符合期望的状态码与响应体

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ProbeError;
use crate::health::{Check, CheckFailure};

/// HTTP探测配置
///
/// 仅 `check_name` 与 `url` 为必填；其余字段零值时取默认：
/// 方法 `GET`，期望状态码 `200`，客户端超时 1 秒。
#[derive(Debug, Clone, Default)]
pub struct HttpCheckConfig {
    /// 检测名称
    pub check_name: String,
    /// 目标URL
    pub url: String,
    /// HTTP方法，默认GET
    pub method: String,
    /// 期望的响应状态码，默认200
    pub expected_status: u16,
    /// 期望响应体包含的子串
    pub expected_body: Option<String>,
    /// 附加请求头
    pub headers: HashMap<String, String>,
    /// JSON请求体（用于POST/PUT探测）
    pub body: Option<Value>,
    /// 客户端超时，默认1秒
    pub timeout: Duration,
    /// 复用的HTTP客户端；未提供时按超时新建
    pub client: Option<Client>,
}

/// HTTP健康检测
#[derive(Debug)]
pub struct HttpCheck {
    name: String,
    url: Url,
    method: Method,
    expected_status: StatusCode,
    expected_body: Option<String>,
    headers: HashMap<String, String>,
    body: Option<Value>,
    client: Client,
    success_details: String,
}

impl HttpCheck {
    /// 由配置构建HTTP检测
    ///
    /// # 参数
    /// * `config` - 探测配置
    ///
    /// # 返回
    /// * `Result<Self, ProbeError>` - 名称、URL或方法非法时报错
    pub fn new(config: HttpCheckConfig) -> Result<Self, ProbeError> {
        if config.check_name.is_empty() {
            return Err(ProbeError::EmptyName);
        }
        if config.url.is_empty() {
            return Err(ProbeError::EmptyUrl);
        }
        let url = Url::parse(&config.url).map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;

        let method = if config.method.is_empty() {
            Method::GET
        } else {
            Method::from_str(&config.method.to_uppercase())
                .map_err(|_| ProbeError::InvalidMethod(config.method.clone()))?
        };

        let expected_status = if config.expected_status == 0 {
            StatusCode::OK
        } else {
            StatusCode::from_u16(config.expected_status)
                .map_err(|_| ProbeError::InvalidStatusCode(config.expected_status))?
        };

        let timeout = if config.timeout.is_zero() {
            Duration::from_secs(1)
        } else {
            config.timeout
        };
        let client = match config.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(timeout)
                .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
                .build()?,
        };

        Ok(HttpCheck {
            success_details: format!("URL [{url}] is accessible"),
            name: config.check_name,
            url,
            method,
            expected_status,
            expected_body: config.expected_body,
            headers: config.headers,
            body: config.body,
            client,
        })
    }

    fn build_request(&self) -> reqwest::RequestBuilder {
        let mut request = self.client.request(self.method.clone(), self.url.clone());
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }
        if let Some(body) = &self.body {
            request = request.json(body);
        }
        request
    }

    /// 将reqwest错误归一化为可读消息
    fn format_request_error(error: &reqwest::Error) -> String {
        if error.is_timeout() {
            "Request timeout".to_string()
        } else if error.is_connect() {
            "Connection refused".to_string()
        } else if error.is_request() {
            "Invalid request".to_string()
        } else if error.is_decode() {
            "Response decode error".to_string()
        } else {
            format!("Request failed: {error}")
        }
    }
}

#[async_trait]
impl Check for HttpCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<Option<Value>, CheckFailure> {
        // 失败路径的详情统一为目标URL，便于诊断
        let details = Value::String(self.url.to_string());

        let response = self.build_request().send().await.map_err(|e| {
            CheckFailure::msg(Self::format_request_error(&e)).with_details(details.clone())
        })?;

        let status = response.status();
        if status != self.expected_status {
            return Err(CheckFailure::msg(format!(
                "unexpected status code: '{}' expected: '{}'",
                status.as_u16(),
                self.expected_status.as_u16()
            ))
            .with_details(details));
        }

        if let Some(expected_body) = &self.expected_body {
            let body = response.text().await.map_err(|e| {
                CheckFailure::msg(format!("failed to read response body: {e}"))
                    .with_details(details.clone())
            })?;
            if !body.contains(expected_body) {
                return Err(CheckFailure::msg(format!(
                    "body does not contain expected content '{expected_body}'"
                ))
                .with_details(details));
            }
        }

        Ok(Some(Value::String(self.success_details.clone())))
    }
}

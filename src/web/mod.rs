//! 健康状态HTTP端点模块
//!
//! 将注册表快照渲染为JSON：整体健康时返回200，否则503

use log::error;
use serde::Deserialize;
use std::collections::HashMap;
use warp::http::{header, Response, StatusCode};
use warp::{Filter, Rejection, Reply};

use crate::health::{CheckResult, HealthRegistry};

/// 请求短报告时 `type` 参数的取值
pub const REPORT_TYPE_SHORT: &str = "short";

/// 查询参数
#[derive(Debug, Deserialize)]
struct ReportQuery {
    /// 报告类型；`short` 时仅输出 PASS/FAIL
    #[serde(rename = "type")]
    report_type: Option<String>,
}

/// 创建健康状态GET路由
///
/// # 参数
/// * `registry` - 要暴露的注册表
///
/// # 返回
/// * warp过滤器：响应体为JSON，状态码200（健康）或503（不健康）。
///   空注册表视为健康，响应体为 `{}`。
pub fn health_endpoint(
    registry: HealthRegistry,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::get()
        .and(warp::query::<ReportQuery>())
        .then(move |query: ReportQuery| {
            let registry = registry.clone();
            async move {
                let (results, healthy) = registry.results().await;
                let short = query.report_type.as_deref() == Some(REPORT_TYPE_SHORT);
                render_report(&results, healthy, short)
            }
        })
}

/// 渲染快照为HTTP响应
fn render_report(
    results: &HashMap<String, CheckResult>,
    healthy: bool,
    short: bool,
) -> Response<String> {
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = if short {
        let short_results: HashMap<&str, &str> = results
            .iter()
            .map(|(name, result)| {
                (
                    name.as_str(),
                    if result.is_healthy() { "PASS" } else { "FAIL" },
                )
            })
            .collect();
        serde_json::to_string_pretty(&short_results)
    } else {
        serde_json::to_string_pretty(results)
    };

    let body = match body {
        Ok(mut body) => {
            body.push('\n');
            body
        }
        Err(e) => {
            // 状态码已定，只能降级为纯文本行
            error!("健康报告序列化失败: {}", e);
            format!("Failed to render results JSON: {e}")
        }
    };

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .expect("静态响应头构建不会失败")
}

//! 指标监听模块
//!
//! 以被动观察者身份把检测事件折算为计数器、计量器与直方图。
//! 收集器为实例级状态，不依赖进程级单例。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::health::{CheckListener, CheckResult, HealthListener};

/// 全体检测的聚合状态所用的标签值
pub const VAL_ALL_CHECKS: &str = "all_checks";

/// 指标值类型
#[derive(Debug, Clone)]
pub enum MetricValue {
    /// 计数器
    Counter(u64),
    /// 计量器
    Gauge(f64),
    /// 直方图
    Histogram {
        sum: f64,
        count: u64,
        buckets: Vec<(f64, u64)>,
    },
}

/// 指标收集器
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    metrics: Arc<Mutex<HashMap<String, MetricValue>>>,
}

impl MetricsCollector {
    /// 创建新的指标收集器
    pub fn new() -> Self {
        Self::default()
    }

    /// 增加计数器
    pub fn increment_counter(&self, name: &str, value: u64) {
        let mut metrics = self.metrics.lock().unwrap();
        let entry = metrics
            .entry(name.to_string())
            .or_insert(MetricValue::Counter(0));
        if let MetricValue::Counter(ref mut count) = entry {
            *count += value;
        }
    }

    /// 设置计量器值
    pub fn set_gauge(&self, name: &str, value: f64) {
        let mut metrics = self.metrics.lock().unwrap();
        metrics.insert(name.to_string(), MetricValue::Gauge(value));
    }

    /// 记录直方图值
    pub fn record_histogram(&self, name: &str, value: f64) {
        let mut metrics = self.metrics.lock().unwrap();
        let entry = metrics
            .entry(name.to_string())
            .or_insert(MetricValue::Histogram {
                sum: 0.0,
                count: 0,
                buckets: vec![
                    (1.0, 0),
                    (5.0, 0),
                    (10.0, 0),
                    (50.0, 0),
                    (100.0, 0),
                    (500.0, 0),
                    (f64::INFINITY, 0),
                ],
            });

        if let MetricValue::Histogram {
            ref mut sum,
            ref mut count,
            ref mut buckets,
        } = entry
        {
            *sum += value;
            *count += 1;
            for (bucket_le, bucket_count) in buckets.iter_mut() {
                if value <= *bucket_le {
                    *bucket_count += 1;
                }
            }
        }
    }

    /// 获取所有指标的快照
    pub fn get_metrics(&self) -> HashMap<String, MetricValue> {
        self.metrics.lock().unwrap().clone()
    }
}

/// 指标监听器
///
/// 同时实现两个监听trait：
/// - 完成事件 -> 按检测名的状态计量器（0/1）、按名与结果的
///   执行计数器、执行耗时直方图（毫秒）
/// - 聚合事件 -> `all_checks` 整体状态计量器
pub struct MetricsListener {
    collector: MetricsCollector,
}

impl MetricsListener {
    /// 以给定收集器创建监听器
    pub fn new(collector: MetricsCollector) -> Self {
        MetricsListener { collector }
    }

    /// 访问底层收集器
    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }

    fn status_value(healthy: bool) -> f64 {
        if healthy {
            1.0
        } else {
            0.0
        }
    }
}

impl CheckListener for MetricsListener {
    fn on_check_completed(&self, name: &str, result: &CheckResult) {
        let healthy = result.is_healthy();
        self.collector
            .set_gauge(&format!("health/status/{name}"), Self::status_value(healthy));
        self.collector.increment_counter(
            &format!("health/check_count/{name}/{}", if healthy { "pass" } else { "fail" }),
            1,
        );
        self.collector.record_histogram(
            &format!("health/execute_time/{name}"),
            result.duration.as_secs_f64() * 1000.0,
        );
    }
}

impl HealthListener for MetricsListener {
    fn on_results_updated(&self, results: &HashMap<String, CheckResult>) {
        let all_healthy = results.values().all(CheckResult::is_healthy);
        self.collector.set_gauge(
            &format!("health/status/{VAL_ALL_CHECKS}"),
            Self::status_value(all_healthy),
        );
    }
}

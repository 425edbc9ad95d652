//! 注册表基准测试
//!
//! 测试结果快照读取与序列化的性能

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use service_pulse::checks::CustomCheck;
use service_pulse::health::{CheckConfig, HealthRegistry};
use std::time::Duration;

/// 构建含指定数量空闲检测的注册表
///
/// 周期与首次延迟都拉到1小时，保证基准期间没有真实执行。
async fn registry_with_checks(count: usize) -> HealthRegistry {
    let registry = HealthRegistry::new();
    let config = CheckConfig::new()
        .with_execution_period(Duration::from_secs(3600))
        .with_initial_delay(Duration::from_secs(3600))
        .with_initially_passing(true);

    for i in 0..count {
        registry
            .register_with(
                CustomCheck::new(format!("check.{i}"), || async {
                    Ok(Some(json!("success")))
                }),
                config.clone(),
            )
            .await
            .unwrap();
    }

    registry
}

fn snapshot_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let registry = rt.block_on(registry_with_checks(16));

    c.bench_function("results_snapshot_16_checks", |b| {
        b.to_async(&rt).iter(|| {
            let registry = registry.clone();
            async move { black_box(registry.results().await) }
        });
    });

    c.bench_function("is_healthy_16_checks", |b| {
        b.to_async(&rt).iter(|| {
            let registry = registry.clone();
            async move { black_box(registry.is_healthy().await) }
        });
    });
}

fn serialization_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let registry = rt.block_on(registry_with_checks(16));
    let (results, _) = rt.block_on(registry.results());

    c.bench_function("results_serialization_16_checks", |b| {
        b.iter(|| {
            let json = serde_json::to_string(&results).unwrap();
            black_box(json)
        });
    });
}

criterion_group!(benches, snapshot_benchmark, serialization_benchmark);
criterion_main!(benches);

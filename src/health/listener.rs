//! 监听器契约与分发模块
//!
//! 定义检测生命周期与聚合结果的观察者接口，以及有序、
//! 隔离panic的扇出包装

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

use super::result::CheckResult;
use super::task::panic_message;

/// 检测生命周期监听器
///
/// 实现必须是非阻塞的：允许记日志、更新指标，
/// 不允许网络IO或其他耗时操作，否则会拖慢后续探测。
pub trait CheckListener: Send + Sync {
    /// 检测注册完成时回调，携带首次执行前的占位结果
    fn on_check_registered(&self, _name: &str, _result: &CheckResult) {}

    /// 检测开始执行时回调
    fn on_check_started(&self, _name: &str) {}

    /// 检测执行完成时回调，携带本次执行的结果
    fn on_check_completed(&self, _name: &str, _result: &CheckResult) {}
}

/// 聚合结果监听器
///
/// 每次执行完成后收到完整结果表的独立副本。
/// 与 [`CheckListener`] 相同，实现必须是非阻塞的。
pub trait HealthListener: Send + Sync {
    /// 结果表更新时回调
    fn on_results_updated(&self, results: &HashMap<String, CheckResult>);
}

/// 检测监听器的有序扇出包装
///
/// 单个监听器panic不会阻止后续监听器执行，也不会影响调度。
#[derive(Clone, Default)]
pub(crate) struct CheckListeners(Vec<Arc<dyn CheckListener>>);

impl CheckListeners {
    pub(crate) fn new(listeners: Vec<Arc<dyn CheckListener>>) -> Self {
        CheckListeners(listeners)
    }

    pub(crate) fn on_check_registered(&self, name: &str, result: &CheckResult) {
        for listener in &self.0 {
            if let Err(panic) =
                catch_unwind(AssertUnwindSafe(|| listener.on_check_registered(name, result)))
            {
                error!("检测监听器panic（注册事件）: {}", panic_message(&*panic));
            }
        }
    }

    pub(crate) fn on_check_started(&self, name: &str) {
        for listener in &self.0 {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener.on_check_started(name))) {
                error!("检测监听器panic（开始事件）: {}", panic_message(&*panic));
            }
        }
    }

    pub(crate) fn on_check_completed(&self, name: &str, result: &CheckResult) {
        for listener in &self.0 {
            if let Err(panic) =
                catch_unwind(AssertUnwindSafe(|| listener.on_check_completed(name, result)))
            {
                error!("检测监听器panic（完成事件）: {}", panic_message(&*panic));
            }
        }
    }
}

/// 聚合监听器的有序扇出包装
#[derive(Clone, Default)]
pub(crate) struct HealthListeners(Vec<Arc<dyn HealthListener>>);

impl HealthListeners {
    pub(crate) fn new(listeners: Vec<Arc<dyn HealthListener>>) -> Self {
        HealthListeners(listeners)
    }

    pub(crate) fn on_results_updated(&self, results: &HashMap<String, CheckResult>) {
        for listener in &self.0 {
            if let Err(panic) =
                catch_unwind(AssertUnwindSafe(|| listener.on_results_updated(results)))
            {
                error!("聚合监听器panic: {}", panic_message(&*panic));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    struct Recorder {
        id: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl CheckListener for Recorder {
        fn on_check_started(&self, name: &str) {
            self.log.lock().unwrap().push(format!("{}:{}", self.id, name));
        }
    }

    struct Panicker;

    impl CheckListener for Panicker {
        fn on_check_started(&self, _name: &str) {
            panic!("listener blew up");
        }
    }

    #[test]
    fn test_fan_out_preserves_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let listeners = CheckListeners::new(vec![
            Arc::new(Recorder {
                id: "a",
                log: Arc::clone(&log),
            }),
            Arc::new(Recorder {
                id: "b",
                log: Arc::clone(&log),
            }),
        ]);

        listeners.on_check_started("db.check");

        assert_eq!(*log.lock().unwrap(), vec!["a:db.check", "b:db.check"]);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_fan_out() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let listeners = CheckListeners::new(vec![
            Arc::new(Panicker),
            Arc::new(Recorder {
                id: "after",
                log: Arc::clone(&log),
            }),
        ]);

        listeners.on_check_started("db.check");

        assert_eq!(*log.lock().unwrap(), vec!["after:db.check"]);
    }

    #[test]
    fn test_health_fan_out_receives_snapshot() {
        struct Counting {
            seen: Arc<Mutex<usize>>,
        }
        impl HealthListener for Counting {
            fn on_results_updated(&self, results: &HashMap<String, CheckResult>) {
                *self.seen.lock().unwrap() = results.len();
            }
        }

        let seen = Arc::new(Mutex::new(0));
        let listeners = HealthListeners::new(vec![Arc::new(Counting {
            seen: Arc::clone(&seen),
        })]);

        let mut results = HashMap::new();
        results.insert(
            "db.check".to_string(),
            CheckResult::initial(Utc::now(), true),
        );
        listeners.on_results_updated(&results);

        assert_eq!(*seen.lock().unwrap(), 1);
    }
}

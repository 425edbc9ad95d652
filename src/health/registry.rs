//! 健康检测注册与调度模块
//!
//! 注册表持有结果表与任务表，为每个检测派生独立的调度
//! 工作协程，周期性执行探测、更新结果并分发监听事件

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::check::Check;
use super::config::{CheckConfig, CheckDefaults, ResolvedConfig};
use super::listener::{CheckListener, CheckListeners, HealthListener, HealthListeners};
use super::result::CheckResult;
use super::task::CheckTask;
use crate::error::RegistryError;

/// 注册表内部状态
///
/// 不变量：任一可观测时刻，`results` 与 `tasks` 的键集合一致。
#[derive(Default)]
struct RegistryState {
    /// 检测名 -> 最近一次结果
    results: HashMap<String, CheckResult>,
    /// 检测名 -> 停止信号发送端（容量1，非阻塞发送）
    tasks: HashMap<String, mpsc::Sender<()>>,
}

struct RegistryInner {
    /// 单一读写锁保护结果表与任务表
    state: RwLock<RegistryState>,
    check_listeners: CheckListeners,
    health_listeners: HealthListeners,
}

/// 健康检测注册表
///
/// 实例级共享状态，克隆开销极小；所有克隆指向同一注册表。
/// 监听器与调度默认值在构建时固定。
#[derive(Clone)]
pub struct HealthRegistry {
    inner: Arc<RegistryInner>,
    defaults: CheckDefaults,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    /// 以全部默认值创建注册表
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// 创建注册表构建器
    pub fn builder() -> HealthRegistryBuilder {
        HealthRegistryBuilder::default()
    }

    /// 注册一个检测，调度参数全部取注册表默认值
    pub async fn register<C>(&self, check: C) -> Result<(), RegistryError>
    where
        C: Check + 'static,
    {
        self.register_with(check, CheckConfig::new()).await
    }

    /// 注册一个检测，并以覆盖项叠加注册表默认值
    ///
    /// # 参数
    /// * `check` - 待调度的检测
    /// * `config` - 按检测覆盖项
    ///
    /// # 返回
    /// * `Result<(), RegistryError>` - 名称为空、解析出的周期非正
    ///   或名称重复时返回错误，此时不产生任何注册副作用
    pub async fn register_with<C>(&self, check: C, config: CheckConfig) -> Result<(), RegistryError>
    where
        C: Check + 'static,
    {
        self.register_arc(Arc::new(check), config).await
    }

    /// 注册一个共享检测实例
    pub async fn register_arc(
        &self,
        check: Arc<dyn Check>,
        config: CheckConfig,
    ) -> Result<(), RegistryError> {
        let name = check.name().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let resolved = config.resolve(&self.defaults);
        if resolved.execution_period.is_zero() {
            return Err(RegistryError::InvalidPeriod { name });
        }

        let initial = CheckResult::initial(Utc::now(), resolved.initially_passing);
        let (stop_tx, stop_rx) = mpsc::channel::<()>(1);

        {
            let mut state = self.inner.state.write().await;
            if state.tasks.contains_key(&name) {
                return Err(RegistryError::DuplicateName { name });
            }
            state.results.insert(name.clone(), initial.clone());
            state.tasks.insert(name.clone(), stop_tx);
        }

        // 注册事件先于工作协程启动，保证先于任何开始/完成事件
        self.inner.check_listeners.on_check_registered(&name, &initial);

        let task = CheckTask {
            check,
            timeout: resolved.execution_timeout,
        };
        tokio::spawn(run_scheduler(Arc::clone(&self.inner), task, resolved, stop_rx));

        debug!("检测已注册: {}", name);
        Ok(())
    }

    /// 注销指定名称的检测
    ///
    /// 仅发送停止信号即返回；结果与任务条目由工作协程在观察到
    /// 信号后移除。进行中的执行会先完成并发布结果。未知名称为
    /// 空操作，重复注销是安全的。
    pub async fn deregister(&self, name: &str) {
        let state = self.inner.state.read().await;
        if let Some(stop) = state.tasks.get(name) {
            // 容量为1的通道：信号已挂起时的重复发送直接忽略
            let _ = stop.try_send(());
            debug!("已发送停止信号: {}", name);
        }
    }

    /// 注销全部检测
    ///
    /// 等价于对每个当前已注册的检测调用 [`deregister`](Self::deregister)，
    /// 立即返回，清理由各工作协程异步完成。
    pub async fn deregister_all(&self) {
        let state = self.inner.state.read().await;
        for stop in state.tasks.values() {
            let _ = stop.try_send(());
        }
    }

    /// 读取当前结果快照
    ///
    /// # 返回
    /// * 结果表的独立副本，以及当前是否整体健康。注册表为空或
    ///   所有结果健康时视为整体健康。
    pub async fn results(&self) -> (HashMap<String, CheckResult>, bool) {
        let state = self.inner.state.read().await;
        let healthy = state.results.values().all(CheckResult::is_healthy);
        (state.results.clone(), healthy)
    }

    /// 判断当前是否整体健康，不复制结果表
    pub async fn is_healthy(&self) -> bool {
        let state = self.inner.state.read().await;
        state.results.values().all(CheckResult::is_healthy)
    }
}

/// 注册表构建器
///
/// 聚合调度默认值与两类监听器；监听器按添加顺序分发。
#[derive(Default)]
pub struct HealthRegistryBuilder {
    defaults: CheckDefaults,
    check_listeners: Vec<Arc<dyn CheckListener>>,
    health_listeners: Vec<Arc<dyn HealthListener>>,
}

impl HealthRegistryBuilder {
    /// 设置默认执行周期
    pub fn with_execution_period(mut self, period: Duration) -> Self {
        self.defaults.execution_period = period;
        self
    }

    /// 设置默认首次执行延迟
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.defaults.initial_delay = delay;
        self
    }

    /// 设置默认的首次执行前健康状态
    pub fn with_initially_passing(mut self, passing: bool) -> Self {
        self.defaults.initially_passing = passing;
        self
    }

    /// 添加检测生命周期监听器
    pub fn with_check_listener(mut self, listener: Arc<dyn CheckListener>) -> Self {
        self.check_listeners.push(listener);
        self
    }

    /// 添加聚合结果监听器
    pub fn with_health_listener(mut self, listener: Arc<dyn HealthListener>) -> Self {
        self.health_listeners.push(listener);
        self
    }

    /// 构建注册表
    pub fn build(self) -> HealthRegistry {
        HealthRegistry {
            inner: Arc::new(RegistryInner {
                state: RwLock::new(RegistryState::default()),
                check_listeners: CheckListeners::new(self.check_listeners),
                health_listeners: HealthListeners::new(self.health_listeners),
            }),
            defaults: self.defaults,
        }
    }
}

/// 单个检测的调度工作协程
///
/// 先等待首次延迟，之后按固定周期循环。每轮等待同时监听
/// 停止信号；执行期间不响应停止，执行与事件发布完成后在
/// 下一次等待中退出并清理。执行严格串行：探测耗时超过周期
/// 时，下一轮顺延，绝不并发执行同一检测。
async fn run_scheduler(
    inner: Arc<RegistryInner>,
    task: CheckTask,
    config: ResolvedConfig,
    mut stop_rx: mpsc::Receiver<()>,
) {
    let name = task.check.name().to_string();
    debug!("启动检测调度协程: {}", name);

    tokio::select! {
        biased;
        _ = stop_rx.recv() => {
            cleanup(&inner, &name).await;
            return;
        }
        _ = tokio::time::sleep(config.initial_delay) => {}
    }

    execute_and_publish(&inner, &task, &name).await;

    let mut ticker = interval_at(
        Instant::now() + config.execution_period,
        config.execution_period,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.recv() => {
                cleanup(&inner, &name).await;
                return;
            }
            _ = ticker.tick() => {
                execute_and_publish(&inner, &task, &name).await;
            }
        }
    }
}

/// 执行一次探测并发布结果
///
/// 事件顺序：开始事件 -> 执行 -> 排他锁内更新结果 ->
/// 完成事件 -> 共享锁内取快照 -> 聚合事件。监听器回调
/// 一律在锁外进行。
async fn execute_and_publish(inner: &Arc<RegistryInner>, task: &CheckTask, name: &str) {
    inner.check_listeners.on_check_started(name);

    let started_at = Utc::now();
    let execution = task.execute().await;
    if let Some(error) = &execution.error {
        warn!("检测执行失败: {}, {:#}", name, error);
    }

    let result = {
        let mut state = inner.state.write().await;
        let result = CheckResult::from_execution(state.results.get(name), execution, started_at);
        state.results.insert(name.to_string(), result.clone());
        result
    };

    inner.check_listeners.on_check_completed(name, &result);

    let snapshot = {
        let state = inner.state.read().await;
        state.results.clone()
    };
    inner.health_listeners.on_results_updated(&snapshot);
}

/// 工作协程退出前的清理
///
/// 排他锁内同时移除任务与结果条目，维持两表键集合一致。
async fn cleanup(inner: &Arc<RegistryInner>, name: &str) {
    let mut state = inner.state.write().await;
    state.tasks.remove(name);
    state.results.remove(name);
    debug!("检测调度协程已停止: {}", name);
}

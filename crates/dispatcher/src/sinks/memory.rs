//! MemorySink - 内存记录型副本
//!
//! 记录每一次成功的调用，支持故障注入与延迟模拟，用于测试与 dry run。

use contracts::{Action, ContractError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::SinkCall;

#[derive(Debug, Default)]
struct MemoryState {
    calls: Mutex<Vec<SinkCall>>,
    failures: AtomicU64,
    fail_all: AtomicBool,
}

/// 内存副本
///
/// `Clone` 共享同一份记录，测试可保留一个克隆用于断言。
#[derive(Debug, Clone)]
pub struct MemorySink {
    pub(crate) name: String,
    state: Arc<MemoryState>,
    /// 对这些实体 ID 的 insert/delete 失败
    fail_ids: Arc<HashSet<i64>>,
    /// 对这些 action 的调用失败
    fail_actions: Arc<HashSet<Action>>,
    /// 每次调用前的延迟
    delay: Option<Duration>,
}

impl MemorySink {
    /// 创建内存副本
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(MemoryState::default()),
            fail_ids: Arc::new(HashSet::new()),
            fail_actions: Arc::new(HashSet::new()),
            delay: None,
        }
    }

    /// 从参数创建 (delay_ms, fail_ids, fail_actions)
    pub fn from_params(name: impl Into<String>, params: &HashMap<String, String>) -> Result<Self, String> {
        let mut sink = Self::new(name);

        if let Some(delay) = params.get("delay_ms") {
            let ms: u64 = delay
                .parse()
                .map_err(|e| format!("invalid delay_ms '{delay}': {e}"))?;
            sink = sink.with_delay(Duration::from_millis(ms));
        }

        if let Some(ids) = params.get("fail_ids") {
            let ids = split_list(ids)
                .map(|s| s.parse::<i64>().map_err(|e| format!("invalid fail_ids entry '{s}': {e}")))
                .collect::<Result<Vec<_>, _>>()?;
            sink = sink.failing_ids(ids);
        }

        if let Some(actions) = params.get("fail_actions") {
            let actions = split_list(actions)
                .map(|s| Action::parse(s).ok_or_else(|| format!("unknown action '{s}'")))
                .collect::<Result<Vec<_>, _>>()?;
            sink = sink.failing_actions(actions);
        }

        Ok(sink)
    }

    /// 每次调用前等待 `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 对指定实体 ID 的 insert/delete 返回错误
    pub fn failing_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.fail_ids = Arc::new(ids.into_iter().collect());
        self
    }

    /// 对指定 action 返回错误
    pub fn failing_actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.fail_actions = Arc::new(actions.into_iter().collect());
        self
    }

    /// 所有调用均返回错误
    pub fn failing_all(self) -> Self {
        self.set_fail_all(true);
        self
    }

    /// 运行时切换全局故障
    pub fn set_fail_all(&self, fail: bool) {
        self.state.fail_all.store(fail, Ordering::SeqCst);
    }

    /// 已成功记录的调用
    pub fn calls(&self) -> Vec<SinkCall> {
        self.state
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 失败次数
    pub fn failures(&self) -> u64 {
        self.state.failures.load(Ordering::SeqCst)
    }

    fn should_fail(&self, call: &SinkCall) -> bool {
        self.state.fail_all.load(Ordering::SeqCst)
            || self.fail_actions.contains(&call.action())
            || call
                .entity_id()
                .is_some_and(|id| self.fail_ids.contains(&id))
    }

    #[instrument(
        name = "memory_sink_apply",
        skip(self, call),
        fields(sink = %self.name, action = %call.action())
    )]
    pub(crate) async fn apply(&self, call: SinkCall) -> Result<(), ContractError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail(&call) {
            self.state.failures.fetch_add(1, Ordering::SeqCst);
            warn!(sink = %self.name, action = %call.action(), "Injected failure");
            return Err(ContractError::sink_write(
                &self.name,
                format!("injected failure for {}", call.action()),
            ));
        }

        debug!(sink = %self.name, call = ?call, "Recorded");
        self.state
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        Ok(())
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

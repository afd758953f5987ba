//! Relay 指标收集模块
//!
//! 记录消息接收、解码失败、副本分发结果与延迟。

use metrics::{counter, gauge, histogram};

/// 记录从传输层收到的消息
pub fn record_message_received(engine: &str, pattern: &str) {
    counter!(
        "cdc_relay_messages_received_total",
        "engine" => engine.to_string(),
        "pattern" => pattern.to_string()
    )
    .increment(1);
}

/// 记录解码失败 (kind: malformed / unsupported_action / ...)
pub fn record_decode_failure(engine: &str, kind: &str) {
    counter!(
        "cdc_relay_decode_failures_total",
        "engine" => engine.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// 记录单个副本的分发结果
pub fn record_dispatch(engine: &str, replica: &str, action: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "cdc_relay_dispatch_total",
        "engine" => engine.to_string(),
        "replica" => replica.to_string(),
        "action" => action.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录单个副本的分发延迟
pub fn record_dispatch_latency_ms(engine: &str, replica: &str, latency_ms: f64) {
    histogram!(
        "cdc_relay_dispatch_latency_ms",
        "engine" => engine.to_string(),
        "replica" => replica.to_string()
    )
    .record(latency_ms);
}

/// 记录消费循环退出 (reason: cancelled / closed / transport_error)
pub fn record_loop_exit(engine: &str, reason: &str) {
    counter!(
        "cdc_relay_loop_exits_total",
        "engine" => engine.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// 记录当前存活的消费循环数
pub fn record_active_loops(engine: &str, count: usize) {
    gauge!(
        "cdc_relay_active_loops",
        "engine" => engine.to_string()
    )
    .set(count as f64);
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_empty_summary_display() {
        let summary = StatsSummary::from(&RunningStats::default());
        assert_eq!(summary.to_string(), "N/A");
    }

    #[test]
    fn test_summary_display() {
        let mut stats = RunningStats::default();
        stats.push(2.0);
        let summary = StatsSummary::from(&stats);
        assert!(summary.to_string().contains("n=1"));
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: calls are no-ops and must not panic
        record_message_received("redis", "queue");
        record_decode_failure("redis", "malformed");
        record_dispatch("redis", "replica-a", "insert", true);
        record_dispatch_latency_ms("redis", "replica-a", 1.5);
        record_loop_exit("redis", "cancelled");
        record_active_loops("redis", 2);
    }
}

//! Per-replica dispatch metrics

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use contracts::ContractError;
use observability::{RunningStats, StatsSummary};

/// Metrics for a single replica
#[derive(Debug, Default)]
pub struct ReplicaMetrics {
    /// Successful dispatches
    dispatched: AtomicU64,
    /// Failed dispatches (including timeouts)
    failed: AtomicU64,
    /// Dispatches that hit the replica deadline
    timed_out: AtomicU64,
    /// Dispatch latency in milliseconds
    latency_ms: Mutex<RunningStats>,
}

impl ReplicaMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one dispatch outcome
    pub fn record(&self, result: &Result<(), ContractError>, elapsed: Duration) {
        match result {
            Ok(()) => {
                self.dispatched.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                if matches!(e, ContractError::SinkTimeout { .. }) {
                    self.timed_out.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        self.latency_ms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn timed_out(&self) -> u64 {
        self.timed_out.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let latency = self.latency_ms.lock().unwrap_or_else(PoisonError::into_inner);
        MetricsSnapshot {
            dispatched: self.dispatched(),
            failed: self.failed(),
            timed_out: self.timed_out(),
            latency_ms: StatsSummary::from(&*latency),
        }
    }
}

/// Snapshot of replica metrics (for reporting)
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub dispatched: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub latency_ms: StatsSummary,
}

impl MetricsSnapshot {
    /// Total dispatch attempts
    pub fn attempts(&self) -> u64 {
        self.dispatched + self.failed
    }
}

//! Engine-level message counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Message counters, summed across consumption loops
#[derive(Debug, Default)]
pub struct EngineStats {
    received: AtomicU64,
    decoded: AtomicU64,
    decode_failures: AtomicU64,
    unsupported_actions: AtomicU64,
}

impl EngineStats {
    pub(crate) fn inc_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_decoded(&self) {
        self.decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_decode_failure(&self, unsupported_action: bool) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
        if unsupported_action {
            self.unsupported_actions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            decoded: self.decoded.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            unsupported_actions: self.unsupported_actions.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`EngineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStatsSnapshot {
    /// Payloads taken off the transport (per loop under pub-sub)
    pub received: u64,
    pub decoded: u64,
    /// All decode failures, unsupported actions included
    pub decode_failures: u64,
    pub unsupported_actions: u64,
}

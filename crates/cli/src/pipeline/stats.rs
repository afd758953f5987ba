//! Relay statistics and reporting.

use std::time::Duration;

use broker::EngineStatsSnapshot;
use dispatcher::MetricsSnapshot;

/// Statistics from a relay run
#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    /// Transport the relay consumed
    pub transport: String,

    /// Channel or queue name
    pub channel: String,

    /// Consumption pattern
    pub pattern: String,

    /// Total duration of the relay run
    pub duration: Duration,

    /// Engine message counters
    pub engine: EngineStatsSnapshot,

    /// Per-replica dispatch metrics, in replica order
    pub replicas: Vec<(String, MetricsSnapshot)>,
}

impl RelayStats {
    /// Decoded messages per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.engine.decoded as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Failed dispatches as a percentage of all attempts
    pub fn failure_rate(&self) -> f64 {
        let (failed, attempts) = self
            .replicas
            .iter()
            .fold((0, 0), |(failed, attempts), (_, m)| {
                (failed + m.failed, attempts + m.attempts())
            });
        if attempts > 0 {
            (failed as f64 / attempts as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Relay Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Transport: {} ({})", self.transport, self.pattern);
        println!("   ├─ Channel: {}", self.channel);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Messages received: {}", self.engine.received);
        println!("   ├─ Messages decoded: {}", self.engine.decoded);
        println!(
            "   ├─ Decode failures: {} ({} unsupported actions)",
            self.engine.decode_failures, self.engine.unsupported_actions
        );
        println!("   ├─ Throughput: {:.2} msg/s", self.throughput());
        println!("   └─ Dispatch failure rate: {:.2}%", self.failure_rate());

        println!("\n📤 Replicas ({})", self.replicas.len());
        for (i, (name, metrics)) in self.replicas.iter().enumerate() {
            let is_last = i == self.replicas.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let child_prefix = if is_last { "   " } else { "│  " };

            println!("   {} [{}] {}", prefix, i, name);
            println!(
                "   {}  ├─ dispatched: {}, failed: {}, timed out: {}",
                child_prefix, metrics.dispatched, metrics.failed, metrics.timed_out
            );
            println!("   {}  └─ latency (ms): {}", child_prefix, metrics.latency_ms);
        }

        println!();
    }
}

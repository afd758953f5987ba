//! # Dispatcher
//!
//! 副本分发模块。
//!
//! 负责：
//! - 将 `MutationRecord` 映射为唯一一次副本操作
//! - 内置副本实现 (log / file / network / memory)
//! - 副本级超时与指标

pub mod action;
pub mod call;
pub mod error;
pub mod metrics;
pub mod replica;
pub mod sinks;

pub use action::dispatch;
pub use call::SinkCall;
pub use contracts::{MutationRecord, ReplicaSink};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, ReplicaMetrics};
pub use replica::{create_replica, create_replicas, Replica, ReplicaKind};
pub use sinks::{FileSink, LogSink, MemorySink, NetworkSink};

//! MessageHandler - decode once, dispatch to replicas
//!
//! Transport-agnostic half of the engine: everything that happens to a
//! payload after it leaves the transport.

use std::time::Instant;

use codec::MutationDecoder;
use contracts::{MutationRecord, ReplicaSink};
use dispatcher::{dispatch, MetricsSnapshot, ReplicaMetrics};
use futures::future::join_all;
use tracing::{debug, error, warn};

use crate::stats::{EngineStats, EngineStatsSnapshot};

/// Longest payload prefix echoed into logs
const PAYLOAD_PREVIEW_LEN: usize = 256;

pub(crate) struct MessageHandler<S> {
    engine: String,
    decoder: MutationDecoder,
    replicas: Vec<S>,
    metrics: Vec<ReplicaMetrics>,
    stats: EngineStats,
}

impl<S: ReplicaSink + Sync> MessageHandler<S> {
    pub(crate) fn new(engine: String, decoder: MutationDecoder, replicas: Vec<S>) -> Self {
        let metrics = replicas.iter().map(|_| ReplicaMetrics::new()).collect();
        Self {
            engine,
            decoder,
            replicas,
            metrics,
            stats: EngineStats::default(),
        }
    }

    pub(crate) fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    /// Decode a payload; failures are logged, counted and dropped.
    ///
    /// `replica` is the owning loop's replica index (pub-sub only).
    pub(crate) fn decode(
        &self,
        pattern: &str,
        replica: Option<usize>,
        payload: &[u8],
    ) -> Option<MutationRecord> {
        self.stats.inc_received();
        observability::record_message_received(&self.engine, pattern);

        match self.decoder.decode(payload) {
            Ok(record) => {
                self.stats.inc_decoded();
                Some(record)
            }
            Err(e) => {
                self.stats.inc_decode_failure(e.is_unsupported_action());
                observability::record_decode_failure(&self.engine, e.kind());
                warn!(
                    engine = %self.engine,
                    pattern,
                    replica_index = ?replica,
                    error = %e,
                    payload = %preview(payload),
                    "Message dropped"
                );
                None
            }
        }
    }

    /// Apply `record` to replica `index`; errors are logged, never returned
    pub(crate) async fn dispatch_to(&self, index: usize, record: &MutationRecord) {
        let replica = &self.replicas[index];
        let started = Instant::now();
        let result = dispatch(replica, record).await;
        let elapsed = started.elapsed();

        self.metrics[index].record(&result, elapsed);
        observability::record_dispatch(
            &self.engine,
            replica.name(),
            record.action.as_str(),
            result.is_ok(),
        );
        observability::record_dispatch_latency_ms(
            &self.engine,
            replica.name(),
            elapsed.as_secs_f64() * 1000.0,
        );

        match result {
            Ok(()) => debug!(
                engine = %self.engine,
                replica_index = index,
                replica = replica.name(),
                action = %record.action,
                collection = %record.collection_name,
                id = record.id,
                "Dispatched"
            ),
            Err(e) => error!(
                engine = %self.engine,
                replica_index = index,
                replica = replica.name(),
                action = %record.action,
                collection = %record.collection_name,
                partition = %record.partition_tag,
                id = record.id,
                error = %e,
                "Replica dispatch failed"
            ),
        }
    }

    /// Apply `record` to every replica concurrently; returns once all finish
    pub(crate) async fn fan_out(&self, record: &MutationRecord) {
        join_all((0..self.replicas.len()).map(|index| self.dispatch_to(index, record))).await;
    }

    pub(crate) fn replica_metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.replicas
            .iter()
            .zip(&self.metrics)
            .map(|(replica, metrics)| (replica.name().to_string(), metrics.snapshot()))
            .collect()
    }

    pub(crate) fn stats(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }
}

fn preview(payload: &[u8]) -> String {
    let end = payload.len().min(PAYLOAD_PREVIEW_LEN);
    let mut text = String::from_utf8_lossy(&payload[..end]).into_owned();
    if payload.len() > end {
        text.push_str("...");
    }
    text
}

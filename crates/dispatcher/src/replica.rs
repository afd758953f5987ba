//! Replica - a configured sink with its per-call deadline

use std::time::Duration;

use contracts::{ContractError, ReplicaConfig, SinkType};
use tracing::{instrument, warn};

use crate::error::DispatcherError;
use crate::sinks::{impl_replica_sink, FileSink, LogSink, MemorySink, NetworkSink};
use crate::SinkCall;

/// Concrete sink behind a replica
pub enum ReplicaKind {
    Log(LogSink),
    File(FileSink),
    Network(NetworkSink),
    Memory(MemorySink),
}

impl ReplicaKind {
    async fn apply(&self, call: SinkCall) -> Result<(), ContractError> {
        match self {
            ReplicaKind::Log(sink) => sink.apply(call).await,
            ReplicaKind::File(sink) => sink.apply(call).await,
            ReplicaKind::Network(sink) => sink.apply(call).await,
            ReplicaKind::Memory(sink) => sink.apply(call).await,
        }
    }
}

/// A replica built from configuration.
///
/// Every operation runs under `timeout` (when set); an elapsed deadline
/// surfaces as [`ContractError::SinkTimeout`].
pub struct Replica {
    pub(crate) name: String,
    kind: ReplicaKind,
    timeout: Option<Duration>,
}

impl Replica {
    pub fn new(name: impl Into<String>, kind: ReplicaKind, timeout: Option<Duration>) -> Self {
        Self {
            name: name.into(),
            kind,
            timeout,
        }
    }

    pub fn kind(&self) -> &ReplicaKind {
        &self.kind
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn apply(&self, call: SinkCall) -> Result<(), ContractError> {
        let Some(limit) = self.timeout else {
            return self.kind.apply(call).await;
        };

        let action = call.action();
        match tokio::time::timeout(limit, self.kind.apply(call)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    replica = %self.name,
                    action = %action,
                    timeout_ms = limit.as_millis() as u64,
                    "Replica call timed out"
                );
                Err(ContractError::SinkTimeout {
                    sink_name: self.name.clone(),
                    timeout_ms: limit.as_millis() as u64,
                })
            }
        }
    }
}

impl_replica_sink!(Replica);

/// Create a replica from configuration
#[instrument(
    name = "dispatcher_create_replica",
    skip(config),
    fields(replica = %config.name, sink_type = ?config.sink_type)
)]
pub async fn create_replica(config: &ReplicaConfig) -> Result<Replica, DispatcherError> {
    let kind = match config.sink_type {
        SinkType::Log => ReplicaKind::Log(LogSink::new(&config.name)),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params).map_err(|source| {
                DispatcherError::Io {
                    name: config.name.clone(),
                    source,
                }
            })?;
            ReplicaKind::File(sink)
        }
        SinkType::Network => {
            let sink = NetworkSink::from_params(&config.name, &config.params).await?;
            ReplicaKind::Network(sink)
        }
        SinkType::Memory => {
            let sink = MemorySink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::replica_creation(&config.name, e))?;
            ReplicaKind::Memory(sink)
        }
    };

    Ok(Replica::new(&config.name, kind, config.timeout()))
}

/// Create all replicas, in configuration order
pub async fn create_replicas(configs: &[ReplicaConfig]) -> Result<Vec<Replica>, DispatcherError> {
    let mut replicas = Vec::with_capacity(configs.len());
    for config in configs {
        replicas.push(create_replica(config).await?);
    }
    Ok(replicas)
}

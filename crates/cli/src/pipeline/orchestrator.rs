//! Relay orchestrator - builds transports, replicas and engines, then runs
//! the configured engine until it ends or a shutdown signal arrives.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use broker::{Broker, BrokerEngine, BrokerRegistry, RelayController};
use codec::MutationDecoder;
use contracts::{RelayConfig, ReplicaSink, TransportConsumer, TransportKind};
use dispatcher::Replica;
use tracing::{info, warn};
use transport::{MemoryTransport, RedisTransport};

use super::RelayStats;

/// Relay run options
#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// The loaded relay configuration
    pub config: RelayConfig,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Assembled relay: one engine per configured transport
pub struct Relay {
    options: RelayOptions,
    controller: RelayController,
}

impl Relay {
    /// Build replicas, transports and engines from configuration
    pub async fn build(options: RelayOptions) -> Result<Self> {
        let config = &options.config;

        info!(replicas = config.replicas.len(), "Creating replicas...");
        let replicas: Vec<Arc<Replica>> = dispatcher::create_replicas(&config.replicas)
            .await
            .context("Failed to create replicas")?
            .into_iter()
            .map(Arc::new)
            .collect();

        let decoder = MutationDecoder::new(config.relay.index_params);
        let mut registry = BrokerRegistry::new();

        for transport in &config.transports {
            let broker: Arc<dyn Broker> = match transport.kind {
                TransportKind::Redis => {
                    let redis = RedisTransport::open(&transport.url)
                        .with_context(|| format!("Failed to open transport '{}'", transport.name))?;
                    build_engine(&transport.name, Arc::new(redis), &replicas, decoder)?
                }
                TransportKind::Memory => {
                    warn!(
                        transport = %transport.name,
                        "Memory transport only receives events published in-process"
                    );
                    build_engine(&transport.name, Arc::new(MemoryTransport::new()), &replicas, decoder)?
                }
            };
            registry
                .register(broker)
                .context("Failed to register transport")?;
            info!(transport = %transport.name, kind = ?transport.kind, "Engine registered");
        }

        Ok(Self {
            options,
            controller: RelayController::new(registry),
        })
    }

    pub fn controller(&self) -> &RelayController {
        &self.controller
    }

    /// Run the configured engine.
    ///
    /// Returns when the engine ends on its own (transport failure) or after
    /// `shutdown` resolves and the engine has drained.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<RelayStats> {
        let start_time = Instant::now();
        let relay = &self.options.config.relay;

        // Initialize Metrics (optional)
        if let Some(port) = self.options.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        info!(
            transport = %relay.transport,
            channel = %relay.channel,
            pattern = %relay.pattern,
            "Starting relay..."
        );

        let running = self
            .controller
            .start(&relay.transport, &relay.channel, &relay.pattern);
        tokio::pin!(running);

        // `running` goes first so the engine is Running before a stop can land
        let result = tokio::select! {
            biased;
            result = &mut running => result,
            _ = shutdown => {
                warn!("Received shutdown signal, stopping relay...");
                let stopped = self.controller.stop_all();
                info!(engines = ?stopped, "Stop signalled, draining in-flight messages");
                running.await
            }
        };
        result.context("Relay terminated")?;

        let broker = self.controller.registry().get(&relay.transport)?;
        let stats = RelayStats {
            transport: relay.transport.clone(),
            channel: relay.channel.clone(),
            pattern: relay.pattern.clone(),
            duration: start_time.elapsed(),
            engine: broker.stats(),
            replicas: broker.replica_metrics(),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            received = stats.engine.received,
            decode_failures = stats.engine.decode_failures,
            "Relay shutdown complete"
        );

        Ok(stats)
    }
}

fn build_engine<T, S>(
    name: &str,
    transport: Arc<T>,
    replicas: &[S],
    decoder: MutationDecoder,
) -> Result<Arc<dyn Broker>>
where
    T: TransportConsumer + 'static,
    S: ReplicaSink + Sync + Clone + 'static,
{
    let engine = BrokerEngine::builder(name, transport)
        .replicas(replicas.iter().cloned())
        .decoder(decoder)
        .build()?;
    Ok(Arc::new(engine))
}

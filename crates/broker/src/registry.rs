//! Broker registry - engines keyed by transport name

use std::collections::HashMap;
use std::sync::Arc;

use contracts::{ConsumptionPattern, ReplicaSink, TransportConsumer};
use dispatcher::MetricsSnapshot;
use futures::future::BoxFuture;

use crate::engine::BrokerEngine;
use crate::error::{BrokerError, LifecycleError};
use crate::state::EngineState;
use crate::stats::EngineStatsSnapshot;

/// Object-safe view of a [`BrokerEngine`], so engines over different
/// transports can share one registry.
pub trait Broker: Send + Sync {
    fn name(&self) -> &str;

    fn state(&self) -> EngineState;

    fn start<'a>(
        &'a self,
        channel: &'a str,
        pattern: ConsumptionPattern,
    ) -> BoxFuture<'a, Result<(), BrokerError>>;

    fn stop(&self) -> Result<(), BrokerError>;

    fn replica_metrics(&self) -> Vec<(String, MetricsSnapshot)>;

    fn stats(&self) -> EngineStatsSnapshot;
}

impl<T, S> Broker for BrokerEngine<T, S>
where
    T: TransportConsumer + 'static,
    S: ReplicaSink + Sync + 'static,
{
    fn name(&self) -> &str {
        BrokerEngine::name(self)
    }

    fn state(&self) -> EngineState {
        BrokerEngine::state(self)
    }

    fn start<'a>(
        &'a self,
        channel: &'a str,
        pattern: ConsumptionPattern,
    ) -> BoxFuture<'a, Result<(), BrokerError>> {
        Box::pin(BrokerEngine::start(self, channel, pattern))
    }

    fn stop(&self) -> Result<(), BrokerError> {
        BrokerEngine::stop(self)
    }

    fn replica_metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        BrokerEngine::replica_metrics(self)
    }

    fn stats(&self) -> EngineStatsSnapshot {
        BrokerEngine::stats(self)
    }
}

/// Registered engines, one per transport name
#[derive(Clone, Default)]
pub struct BrokerRegistry {
    brokers: HashMap<String, Arc<dyn Broker>>,
}

impl BrokerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the broker's own name
    pub fn register(&mut self, broker: Arc<dyn Broker>) -> Result<(), LifecycleError> {
        let name = broker.name().to_string();
        if self.brokers.contains_key(&name) {
            return Err(LifecycleError::DuplicateTransport { name });
        }
        self.brokers.insert(name, broker);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Broker>, LifecycleError> {
        self.brokers
            .get(name)
            .cloned()
            .ok_or_else(|| LifecycleError::UnknownTransport {
                name: name.to_string(),
            })
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.brokers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn brokers(&self) -> impl Iterator<Item = &Arc<dyn Broker>> {
        self.brokers.values()
    }

    pub fn len(&self) -> usize {
        self.brokers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brokers.is_empty()
    }
}

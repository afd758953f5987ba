//! RelayController - Start / Stop by transport name

use contracts::ConsumptionPattern;
use tracing::{info, instrument, warn};

use crate::error::{BrokerError, LifecycleError};
use crate::registry::BrokerRegistry;
use crate::state::EngineState;

/// Resolves transport names to engines and drives their lifecycle
#[derive(Clone)]
pub struct RelayController {
    registry: BrokerRegistry,
}

impl RelayController {
    pub fn new(registry: BrokerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &BrokerRegistry {
        &self.registry
    }

    /// Start the engine registered as `transport`.
    ///
    /// The pattern is checked before any engine or transport is touched.
    /// Resolves when that engine stops: `Ok(())` after [`stop`](Self::stop),
    /// an error when the transport ended consumption.
    #[instrument(name = "relay_start", skip(self))]
    pub async fn start(&self, transport: &str, channel: &str, pattern: &str) -> Result<(), BrokerError> {
        let pattern = ConsumptionPattern::parse(pattern).ok_or_else(|| {
            LifecycleError::InvalidPattern {
                pattern: pattern.to_string(),
            }
        })?;
        let broker = self.registry.get(transport)?;

        info!(transport, channel, pattern = %pattern, "Starting relay");
        broker.start(channel, pattern).await
    }

    /// Signal the engine registered as `transport` to stop
    #[instrument(name = "relay_stop", skip(self))]
    pub fn stop(&self, transport: &str) -> Result<(), BrokerError> {
        self.registry.get(transport)?.stop()
    }

    /// Stop every running engine; returns the names signalled
    pub fn stop_all(&self) -> Vec<String> {
        let mut stopped = Vec::new();
        for broker in self.registry.brokers() {
            if broker.state() != EngineState::Running {
                continue;
            }
            match broker.stop() {
                Ok(()) => stopped.push(broker.name().to_string()),
                Err(e) => warn!(engine = broker.name(), error = %e, "Stop failed"),
            }
        }
        stopped.sort();
        stopped
    }
}

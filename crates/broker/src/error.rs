//! Broker error types

use contracts::ContractError;
use thiserror::Error;

/// Errors returned synchronously by Start / Stop and registry lookups
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// Pattern is neither `pub-sub` nor `queue`
    #[error("invalid consumption pattern '{pattern}', expected 'pub-sub' or 'queue'")]
    InvalidPattern { pattern: String },

    /// No engine registered under this transport name
    #[error("unknown transport '{name}'")]
    UnknownTransport { name: String },

    /// Two engines registered under one name
    #[error("transport '{name}' is already registered")]
    DuplicateTransport { name: String },

    /// Engine built without replicas
    #[error("engine '{engine}' has no replicas")]
    NoReplicas { engine: String },

    #[error("engine '{engine}' is already running")]
    AlreadyRunning { engine: String },

    /// Stopping or stopped engines cannot start again
    #[error("engine '{engine}' is stopped and cannot be restarted")]
    AlreadyStopped { engine: String },

    #[error("engine '{engine}' is not running")]
    NotRunning { engine: String },

    /// A stop signal is already pending for this engine
    #[error("stop already requested for engine '{engine}'")]
    StopAlreadyRequested { engine: String },
}

/// Broker errors
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Transport failure that ended the engine
    #[error("engine '{engine}' stopped on transport failure: {source}")]
    Transport {
        engine: String,
        #[source]
        source: ContractError,
    },
}

impl BrokerError {
    pub fn transport(engine: impl Into<String>, source: ContractError) -> Self {
        Self::Transport {
            engine: engine.into(),
            source,
        }
    }

    /// Lifecycle variant, if any
    pub fn lifecycle(&self) -> Option<&LifecycleError> {
        match self {
            Self::Lifecycle(e) => Some(e),
            Self::Transport { .. } => None,
        }
    }
}

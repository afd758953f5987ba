//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Replica creation error
    #[error("failed to create replica '{name}': {message}")]
    ReplicaCreation { name: String, message: String },

    /// Sink refused to connect (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// Replica storage could not be opened
    #[error("io error for replica '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl DispatcherError {
    /// Create a replica creation error
    pub fn replica_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReplicaCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}

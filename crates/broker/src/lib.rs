//! # Broker
//!
//! CDC relay engine.
//!
//! Responsibilities:
//! - Consume a transport channel (pub-sub) or queue (queue)
//! - Decode each payload and dispatch it to every replica
//! - One-shot lifecycle: start, stop, report
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use broker::{BrokerEngine, BrokerRegistry, RelayController};
//! use dispatcher::MemorySink;
//! use transport::MemoryTransport;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = BrokerEngine::builder("memory", Arc::new(MemoryTransport::new()))
//!     .replica(MemorySink::new("replica-a"))
//!     .build()?;
//!
//! let mut registry = BrokerRegistry::new();
//! registry.register(Arc::new(engine))?;
//!
//! let controller = RelayController::new(registry);
//! controller.start("memory", "cdc", "queue").await?;
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod handler;
mod lifecycle;
mod registry;
mod state;
mod stats;

pub use engine::{BrokerEngine, BrokerEngineBuilder};
pub use error::{BrokerError, LifecycleError};
pub use lifecycle::RelayController;
pub use registry::{Broker, BrokerRegistry};
pub use state::EngineState;
pub use stats::{EngineStats, EngineStatsSnapshot};

//! LogSink - logs each replica operation via tracing

use contracts::ContractError;
use tracing::{debug, info, instrument};

use crate::SinkCall;

/// Sink that logs operations for debugging and dry runs
pub struct LogSink {
    pub(crate) name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[instrument(
        name = "log_sink_apply",
        skip(self, call),
        fields(sink = %self.name, action = %call.action())
    )]
    pub(crate) async fn apply(&self, call: SinkCall) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            action = %call.action(),
            collection = %call.collection(),
            id = ?call.entity_id(),
            "Mutation applied"
        );
        debug!(sink = %self.name, call = ?call, "Mutation detail");
        Ok(())
    }
}

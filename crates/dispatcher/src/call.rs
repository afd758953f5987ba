//! SinkCall - one replica operation with its arguments
//!
//! Shared representation used by the bundled sinks to log, journal, send or
//! record an operation.

use contracts::Action;
use serde::Serialize;

/// A single replica operation, owned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkCall {
    Insert {
        collection: String,
        partition: String,
        id: i64,
        vector: Vec<f32>,
    },
    Delete {
        collection: String,
        partition: String,
        id: i64,
    },
    CreateCollection {
        collection: String,
        dimension: i64,
        index_file_size: i64,
        metric_type: i32,
    },
    DropCollection {
        collection: String,
    },
    CreatePartition {
        collection: String,
        partition: String,
    },
    DropPartition {
        collection: String,
        partition: String,
    },
    CreateIndex {
        collection: String,
        index_type: i64,
        extra_params: String,
    },
    DropIndex {
        collection: String,
    },
}

impl SinkCall {
    /// Action kind this call performs
    pub fn action(&self) -> Action {
        match self {
            SinkCall::Insert { .. } => Action::Insert,
            SinkCall::Delete { .. } => Action::Delete,
            SinkCall::CreateCollection { .. } => Action::CreateCollection,
            SinkCall::DropCollection { .. } => Action::DropCollection,
            SinkCall::CreatePartition { .. } => Action::CreatePartition,
            SinkCall::DropPartition { .. } => Action::DropPartition,
            SinkCall::CreateIndex { .. } => Action::CreateIndex,
            SinkCall::DropIndex { .. } => Action::DropIndex,
        }
    }

    /// Target collection
    pub fn collection(&self) -> &str {
        match self {
            SinkCall::Insert { collection, .. }
            | SinkCall::Delete { collection, .. }
            | SinkCall::CreateCollection { collection, .. }
            | SinkCall::DropCollection { collection }
            | SinkCall::CreatePartition { collection, .. }
            | SinkCall::DropPartition { collection, .. }
            | SinkCall::CreateIndex { collection, .. }
            | SinkCall::DropIndex { collection } => collection,
        }
    }

    /// Entity id for insert/delete
    pub fn entity_id(&self) -> Option<i64> {
        match self {
            SinkCall::Insert { id, .. } | SinkCall::Delete { id, .. } => Some(*id),
            _ => None,
        }
    }
}

//! MutationRecord - canonical decoded form of one change event
//!
//! Produced by the codec, read concurrently by every replica dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of mutation kinds carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Insert,
    Delete,
    CreateCollection,
    DropCollection,
    CreatePartition,
    DropPartition,
    CreateIndex,
    DropIndex,
}

impl Action {
    /// All actions, in wire order
    pub const ALL: [Action; 8] = [
        Action::Insert,
        Action::Delete,
        Action::CreateCollection,
        Action::DropCollection,
        Action::CreatePartition,
        Action::DropPartition,
        Action::CreateIndex,
        Action::DropIndex,
    ];

    /// Parse the wire name (`insert`, `drop-index`, ...)
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == value)
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Insert => "insert",
            Action::Delete => "delete",
            Action::CreateCollection => "create-collection",
            Action::DropCollection => "drop-collection",
            Action::CreatePartition => "create-partition",
            Action::DropPartition => "drop-partition",
            Action::CreateIndex => "create-index",
            Action::DropIndex => "drop-index",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index tuning payload.
///
/// Producers send either a numeric `n_list` or a free-form `extra_params`
/// string; which one is accepted is fixed per deployment by [`IndexParamFormat`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexParams {
    NList(i64),
    Extra(String),
}

impl IndexParams {
    /// Render as the store's extra-params JSON text.
    ///
    /// Numeric values become `{"nlist":N}`, string values pass through.
    pub fn extra_params(&self) -> String {
        match self {
            IndexParams::NList(n) => format!("{{\"nlist\":{n}}}"),
            IndexParams::Extra(s) => s.clone(),
        }
    }

    /// Zero value for a given format (field absent on the wire)
    pub fn empty(format: IndexParamFormat) -> Self {
        match format {
            IndexParamFormat::NList => IndexParams::NList(0),
            IndexParamFormat::ExtraParams => IndexParams::Extra(String::new()),
        }
    }
}

/// Which index parameter field the deployed producer emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexParamFormat {
    /// Numeric `n_list`
    #[default]
    #[serde(rename = "nlist")]
    NList,
    /// String `extra_params`
    ExtraParams,
}

/// Decoded change event.
///
/// Fields not relevant to `action` hold zero values and are ignored by the
/// dispatcher. `vector` is only populated for [`Action::Insert`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub action: Action,
    pub vector: Vec<f32>,
    pub collection_name: String,
    pub partition_tag: String,
    pub id: i64,
    pub dimension: i64,
    pub index_file_size: i64,
    /// Only populated for [`Action::CreateIndex`]
    pub index_params: Option<IndexParams>,
    pub index_type: i64,
    pub metric_type: i32,
}

impl MutationRecord {
    /// Record with only an action set, other fields zeroed
    pub fn new(action: Action) -> Self {
        Self {
            action,
            vector: Vec::new(),
            collection_name: String::new(),
            partition_tag: String::new(),
            id: 0,
            dimension: 0,
            index_file_size: 0,
            index_params: None,
            index_type: 0,
            metric_type: 0,
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection_name = collection.into();
        self
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition_tag = partition.into();
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = vector;
        self
    }
}

//! Wire schema - one JSON object per change event

use serde::{Deserialize, Serialize};

/// Raw wire message.
///
/// Every field is optional at the structural level; presence rules are
/// applied by the decoder per action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Hex-encoded little-endian f32 payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_list: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_params: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_file_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_type: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<i32>,
}

//! Consumption pattern selection

use serde::{Deserialize, Serialize};
use std::fmt;

/// How an engine reads its transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsumptionPattern {
    /// Broadcast: one subscription per replica, each sees every message
    PubSub,
    /// Competing delivery: one loop pops and fans out to all replicas
    Queue,
}

impl ConsumptionPattern {
    /// Parse `pub-sub` / `queue`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pub-sub" => Some(Self::PubSub),
            "queue" => Some(Self::Queue),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PubSub => "pub-sub",
            Self::Queue => "queue",
        }
    }
}

impl fmt::Display for ConsumptionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

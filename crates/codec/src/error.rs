//! Decode error types

use thiserror::Error;

/// Per-message decode failures. Never fatal to a consumption loop.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload is not a JSON object of the expected shape
    #[error("malformed message: {message}")]
    Malformed { message: String },

    /// `action` field absent or null
    #[error("message has no action")]
    MissingAction,

    /// Valid structure, unrecognized action value
    #[error("unsupported action '{action}'")]
    UnsupportedAction { action: String },

    /// `vector` is not valid hex
    #[error("vector is not valid hex: {message}")]
    InvalidVectorHex { message: String },

    /// Insert vector byte length is not a multiple of 4
    #[error("vector payload of {len} bytes is not a whole number of f32 values")]
    InvalidVectorPayload { len: usize },

    /// Index parameters sent in the field this deployment does not accept
    #[error("index params expected in '{expected}', found '{found}'")]
    IndexParamMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl DecodeError {
    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "malformed",
            Self::MissingAction => "missing_action",
            Self::UnsupportedAction { .. } => "unsupported_action",
            Self::InvalidVectorHex { .. } => "invalid_vector_hex",
            Self::InvalidVectorPayload { .. } => "invalid_vector_payload",
            Self::IndexParamMismatch { .. } => "index_param_mismatch",
        }
    }

    /// Whether this is an unknown-action rejection
    pub fn is_unsupported_action(&self) -> bool {
        matches!(self, Self::UnsupportedAction { .. })
    }
}

//! # Codec
//!
//! Wire message decoding.
//!
//! Responsibilities:
//! - Parse the JSON change event schema
//! - Validate the action against the closed `Action` set
//! - Decode hex vectors as little-endian f32 (bounds checked)
//!
//! # Example
//!
//! ```
//! use codec::MutationDecoder;
//!
//! let payload = br#"{"action":"insert","vector":"0000803f","collection_name":"c1","partition_tag":"p1","id":7}"#;
//! let record = MutationDecoder::default().decode(payload).unwrap();
//! assert_eq!(record.vector, vec![1.0]);
//! ```

mod decoder;
mod error;
mod vector;
mod wire;

pub use decoder::MutationDecoder;
pub use error::DecodeError;
pub use vector::{decode_f32_le, decode_vector, encode_vector};
pub use wire::WireMessage;

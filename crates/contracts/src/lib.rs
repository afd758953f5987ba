//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data flow
//! - Transport payload (bytes) -> `MutationRecord` (codec)
//! - `MutationRecord` -> `ReplicaSink` operation (dispatcher)

mod config;
mod error;
mod mutation;
mod pattern;
mod sink;
mod transport;

pub use config::*;
pub use error::*;
pub use mutation::*;
pub use pattern::ConsumptionPattern;
pub use sink::*;
pub use transport::*;

//! # Transport
//!
//! Concrete message transports implementing the consumer/producer contracts.
//!
//! - [`RedisTransport`]: SUBSCRIBE + BRPOP, PUBLISH + LPUSH
//! - [`MemoryTransport`]: in-process broadcast channels and FIFO queues

mod memory;
mod redis_transport;

pub use crate::memory::{MemorySubscription, MemoryTransport, DEFAULT_CHANNEL_CAPACITY};
pub use crate::redis_transport::{RedisSubscription, RedisTransport};

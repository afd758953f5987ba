//! Transport boundary - how raw change events reach the relay
//!
//! Two consumption primitives (subscribe / blocking pop) and the matching
//! producer primitives (publish / push). Payloads are opaque bytes.

use bytes::Bytes;
use std::future::Future;
use std::time::Duration;

use crate::ContractError;

/// An open broadcast subscription.
pub trait Subscription: Send {
    /// Wait for the next payload.
    ///
    /// `Ok(None)` means the subscription ended (channel closed by the
    /// transport). Errors mean the subscription is broken.
    fn next_message(&mut self) -> impl Future<Output = Result<Option<Bytes>, ContractError>> + Send;
}

/// Consumer side of a message transport.
pub trait TransportConsumer: Send + Sync {
    type Subscription: Subscription + 'static;

    /// Open a fresh subscription to `channel`
    fn subscribe(
        &self,
        channel: &str,
    ) -> impl Future<Output = Result<Self::Subscription, ContractError>> + Send;

    /// Pop one payload from `queue`.
    ///
    /// `timeout = None` blocks until a payload arrives. `Ok(None)` is
    /// returned only when a timeout elapses with the queue empty.
    fn blocking_pop(
        &self,
        queue: &str,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Option<Bytes>, ContractError>> + Send;
}

/// Producer side of a message transport.
pub trait TransportProducer: Send + Sync {
    /// Broadcast on `channel`, returns the number of receivers reached
    fn publish(
        &self,
        channel: &str,
        payload: Bytes,
    ) -> impl Future<Output = Result<u64, ContractError>> + Send;

    /// Push onto `queue`, returns the queue length after the push
    fn push(
        &self,
        queue: &str,
        payload: Bytes,
    ) -> impl Future<Output = Result<u64, ContractError>> + Send;
}

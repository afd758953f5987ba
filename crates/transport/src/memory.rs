//! MemoryTransport - in-process broadcast channels and FIFO queues
//!
//! Same two consumption primitives as a network broker, without the network.
//! Used by tests, demos and dry runs.

use bytes::Bytes;
use contracts::{ContractError, Subscription, TransportConsumer, TransportProducer};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default per-channel broadcast buffer
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Clone)]
struct MemoryQueue {
    tx: async_channel::Sender<Bytes>,
    rx: async_channel::Receiver<Bytes>,
}

#[derive(Default)]
struct MemoryInner {
    channels: Mutex<HashMap<String, broadcast::Sender<Bytes>>>,
    queues: Mutex<HashMap<String, MemoryQueue>>,
}

/// In-process transport. `Clone` shares the same channels and queues.
#[derive(Clone)]
pub struct MemoryTransport {
    inner: Arc<MemoryInner>,
    capacity: usize,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Broadcast buffer per channel; slow subscribers lag past this
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(MemoryInner::default()),
            capacity: capacity.max(1),
        }
    }

    fn channel(&self, channel: &str) -> broadcast::Sender<Bytes> {
        let mut channels = self
            .inner
            .channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    fn queue(&self, queue: &str) -> MemoryQueue {
        let mut queues = self
            .inner
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        queues
            .entry(queue.to_string())
            .or_insert_with(|| {
                let (tx, rx) = async_channel::unbounded();
                MemoryQueue { tx, rx }
            })
            .clone()
    }

    /// Number of live subscriptions on `channel`
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.inner
            .channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Number of payloads waiting in `queue`
    pub fn queue_len(&self, queue: &str) -> usize {
        self.inner
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(queue)
            .map(|q| q.rx.len())
            .unwrap_or(0)
    }

    /// Sever `channel`: existing subscriptions drain and then end.
    pub fn close_channel(&self, channel: &str) {
        let removed = self
            .inner
            .channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(channel);
        if removed.is_some() {
            debug!(channel, "Memory channel closed");
        }
    }

    /// Close `queue`: pops drain what is left, then fail.
    pub fn close_queue(&self, queue: &str) {
        self.queue(queue).tx.close();
        debug!(queue, "Memory queue closed");
    }
}

/// Subscription on a memory channel
pub struct MemorySubscription {
    channel: String,
    rx: broadcast::Receiver<Bytes>,
}

impl Subscription for MemorySubscription {
    async fn next_message(&mut self) -> Result<Option<Bytes>, ContractError> {
        loop {
            match self.rx.recv().await {
                Ok(payload) => return Ok(Some(payload)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(channel = %self.channel, skipped, "Subscriber lagged, messages lost");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }
}

impl TransportConsumer for MemoryTransport {
    type Subscription = MemorySubscription;

    async fn subscribe(&self, channel: &str) -> Result<MemorySubscription, ContractError> {
        let rx = self.channel(channel).subscribe();
        debug!(channel, "Memory subscription opened");
        Ok(MemorySubscription {
            channel: channel.to_string(),
            rx,
        })
    }

    async fn blocking_pop(
        &self,
        queue: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<Bytes>, ContractError> {
        let rx = self.queue(queue).rx;
        let received = match timeout {
            None => rx.recv().await,
            Some(limit) => match tokio::time::timeout(limit, rx.recv()).await {
                Ok(received) => received,
                Err(_) => return Ok(None),
            },
        };
        received
            .map(Some)
            .map_err(|_| ContractError::transport_closed(queue))
    }
}

impl TransportProducer for MemoryTransport {
    async fn publish(&self, channel: &str, payload: Bytes) -> Result<u64, ContractError> {
        // No subscribers is not an error, the message is simply not delivered
        Ok(self
            .channel(channel)
            .send(payload)
            .map(|n| n as u64)
            .unwrap_or(0))
    }

    async fn push(&self, queue: &str, payload: Bytes) -> Result<u64, ContractError> {
        let queue_handle = self.queue(queue);
        queue_handle
            .tx
            .send(payload)
            .await
            .map_err(|_| ContractError::transport_closed(queue))?;
        Ok(queue_handle.tx.len() as u64)
    }
}

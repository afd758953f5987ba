//! Test doubles: a timing probe sink and a transport that can sever one
//! subscription.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use contracts::{
    ContractError, ReplicaSink, Subscription, TransportConsumer, TransportProducer,
};
use transport::{MemorySubscription, MemoryTransport};

/// Begin/end marker of one sink call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Begin,
    End,
}

/// (replica index, phase, entity id)
pub type ProbeEvent = (usize, Phase, i64);

/// Shared, ordered log of probe events
#[derive(Clone, Default)]
pub struct ProbeLog(Arc<Mutex<Vec<ProbeEvent>>>);

impl ProbeLog {
    fn push(&self, event: ProbeEvent) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<ProbeEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, phase: Phase) -> usize {
        self.events().iter().filter(|e| e.1 == phase).count()
    }
}

/// Sink that logs begin/end around an artificial delay
pub struct ProbeSink {
    name: String,
    index: usize,
    delay: Duration,
    log: ProbeLog,
}

impl ProbeSink {
    pub fn new(index: usize, delay: Duration, log: ProbeLog) -> Self {
        Self {
            name: format!("probe-{index}"),
            index,
            delay,
            log,
        }
    }

    async fn call(&self, id: i64) -> Result<(), ContractError> {
        self.log.push((self.index, Phase::Begin, id));
        tokio::time::sleep(self.delay).await;
        self.log.push((self.index, Phase::End, id));
        Ok(())
    }
}

impl ReplicaSink for ProbeSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(
        &self,
        _collection: &str,
        _partition: &str,
        id: i64,
        _vector: &[f32],
    ) -> Result<(), ContractError> {
        self.call(id).await
    }

    async fn delete(&self, _collection: &str, _partition: &str, id: i64) -> Result<(), ContractError> {
        self.call(id).await
    }

    async fn create_collection(
        &self,
        _collection: &str,
        _dimension: i64,
        _index_file_size: i64,
        _metric_type: i32,
    ) -> Result<(), ContractError> {
        self.call(-1).await
    }

    async fn drop_collection(&self, _collection: &str) -> Result<(), ContractError> {
        self.call(-1).await
    }

    async fn create_partition(&self, _collection: &str, _partition: &str) -> Result<(), ContractError> {
        self.call(-1).await
    }

    async fn drop_partition(&self, _collection: &str, _partition: &str) -> Result<(), ContractError> {
        self.call(-1).await
    }

    async fn create_index(
        &self,
        _collection: &str,
        _index_type: i64,
        _extra_params: &str,
    ) -> Result<(), ContractError> {
        self.call(-1).await
    }

    async fn drop_index(&self, _collection: &str) -> Result<(), ContractError> {
        self.call(-1).await
    }
}

/// Memory transport whose first subscription breaks after `sever_after`
/// messages. Counts every consumer interaction.
#[derive(Clone)]
pub struct SeveringTransport {
    pub inner: MemoryTransport,
    sever_after: usize,
    severed_once: Arc<AtomicBool>,
    interactions: Arc<AtomicUsize>,
}

impl SeveringTransport {
    pub fn new(sever_after: usize) -> Self {
        Self {
            inner: MemoryTransport::new(),
            sever_after,
            severed_once: Arc::new(AtomicBool::new(false)),
            interactions: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn interactions(&self) -> usize {
        self.interactions.load(Ordering::SeqCst)
    }
}

pub struct SeveringSubscription {
    inner: MemorySubscription,
    remaining: Option<usize>,
}

impl Subscription for SeveringSubscription {
    async fn next_message(&mut self) -> Result<Option<Bytes>, ContractError> {
        match self.remaining {
            Some(0) => Err(ContractError::transport("severed", "connection reset")),
            Some(ref mut remaining) => {
                let next = self.inner.next_message().await;
                *remaining -= 1;
                next
            }
            None => self.inner.next_message().await,
        }
    }
}

impl TransportConsumer for SeveringTransport {
    type Subscription = SeveringSubscription;

    async fn subscribe(&self, channel: &str) -> Result<SeveringSubscription, ContractError> {
        self.interactions.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.subscribe(channel).await?;
        let first = !self.severed_once.swap(true, Ordering::SeqCst);
        Ok(SeveringSubscription {
            inner,
            remaining: first.then_some(self.sever_after),
        })
    }

    async fn blocking_pop(
        &self,
        queue: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<Bytes>, ContractError> {
        self.interactions.fetch_add(1, Ordering::SeqCst);
        self.inner.blocking_pop(queue, timeout).await
    }
}

impl SeveringTransport {
    pub async fn publish(&self, channel: &str, payload: &'static [u8]) {
        self.inner
            .publish(channel, Bytes::from_static(payload))
            .await
            .unwrap();
    }
}

/// Poll `condition` until true; panics after ~2 s
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

//! RedisTransport - SUBSCRIBE / BRPOP consumer, PUBLISH / LPUSH producer

use bytes::Bytes;
use contracts::{ContractError, Subscription, TransportConsumer, TransportProducer};
use futures::stream::BoxStream;
use futures::StreamExt;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::Client;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, instrument};

/// Redis-backed transport.
///
/// Every subscription gets its own pub/sub connection. Blocking pops use a
/// dedicated connection so they never stall producer commands; a pop holds
/// that connection exclusively until its reply arrives, and a cancelled pop
/// closes it so the server drops the pending BRPOP.
pub struct RedisTransport {
    url: String,
    client: Client,
    producer: OnceCell<ConnectionManager>,
    pop_conn: Mutex<Option<MultiplexedConnection>>,
}

impl RedisTransport {
    /// Prepare a client for `url` (no connection is made yet)
    pub fn open(url: &str) -> Result<Self, ContractError> {
        let client = Client::open(url)
            .map_err(|e| ContractError::transport(url, format!("invalid Redis URL: {e}")))?;

        Ok(Self {
            url: url.to_string(),
            client,
            producer: OnceCell::new(),
            pop_conn: Mutex::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Take the idle pop connection out of its slot, connecting if there is none
    async fn take_pop_connection(&self, queue: &str) -> Result<MultiplexedConnection, ContractError> {
        if let Some(conn) = self.pop_conn.lock().await.take() {
            return Ok(conn);
        }

        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ContractError::transport(queue, format!("connect failed: {e}")))?;
        info!(url = %self.url, "Redis queue connection established");
        Ok(conn)
    }

    /// Return a connection whose last command completed
    async fn release_pop_connection(&self, conn: MultiplexedConnection) {
        let mut slot = self.pop_conn.lock().await;
        if slot.is_none() {
            *slot = Some(conn);
        }
    }

    async fn producer(&self, channel: &str) -> Result<ConnectionManager, ContractError> {
        self.producer
            .get_or_try_init(|| async {
                self.client
                    .get_connection_manager()
                    .await
                    .map_err(|e| ContractError::transport(channel, format!("connect failed: {e}")))
            })
            .await
            .cloned()
    }
}

/// Subscription on a Redis channel
pub struct RedisSubscription {
    channel: String,
    messages: BoxStream<'static, redis::Msg>,
}

impl Subscription for RedisSubscription {
    async fn next_message(&mut self) -> Result<Option<Bytes>, ContractError> {
        match self.messages.next().await {
            Some(msg) => Ok(Some(Bytes::copy_from_slice(msg.get_payload_bytes()))),
            None => {
                debug!(channel = %self.channel, "Redis subscription stream ended");
                Ok(None)
            }
        }
    }
}

impl TransportConsumer for RedisTransport {
    type Subscription = RedisSubscription;

    #[instrument(name = "redis_subscribe", skip(self), fields(url = %self.url))]
    async fn subscribe(&self, channel: &str) -> Result<RedisSubscription, ContractError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| ContractError::transport(channel, format!("connect failed: {e}")))?;

        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| ContractError::transport(channel, format!("SUBSCRIBE failed: {e}")))?;

        debug!(channel, "Redis subscription opened");

        Ok(RedisSubscription {
            channel: channel.to_string(),
            messages: pubsub.into_on_message().boxed(),
        })
    }

    async fn blocking_pop(
        &self,
        queue: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<Bytes>, ContractError> {
        // Dropped together with this future if the pop is cancelled
        let mut conn = self.take_pop_connection(queue).await?;
        // BRPOP timeout 0 blocks indefinitely
        let timeout_secs = timeout.map(|t| t.as_secs_f64()).unwrap_or(0.0);

        let reply: Result<Option<(String, Vec<u8>)>, _> = redis::cmd("BRPOP")
            .arg(queue)
            .arg(timeout_secs)
            .query_async(&mut conn)
            .await;

        match reply {
            Ok(popped) => {
                self.release_pop_connection(conn).await;
                Ok(popped.map(|(_, payload)| Bytes::from(payload)))
            }
            // A failed connection is not reused
            Err(e) => Err(ContractError::transport(queue, format!("BRPOP failed: {e}"))),
        }
    }
}

impl TransportProducer for RedisTransport {
    async fn publish(&self, channel: &str, payload: Bytes) -> Result<u64, ContractError> {
        let mut conn = self.producer(channel).await?;
        redis::cmd("PUBLISH")
            .arg(channel)
            .arg(payload.as_ref())
            .query_async(&mut conn)
            .await
            .map_err(|e| ContractError::transport(channel, format!("PUBLISH failed: {e}")))
    }

    async fn push(&self, queue: &str, payload: Bytes) -> Result<u64, ContractError> {
        let mut conn = self.producer(queue).await?;
        redis::cmd("LPUSH")
            .arg(queue)
            .arg(payload.as_ref())
            .query_async(&mut conn)
            .await
            .map_err(|e| ContractError::transport(queue, format!("LPUSH failed: {e}")))
    }
}

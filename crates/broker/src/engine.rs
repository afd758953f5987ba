//! BrokerEngine - consumption loops over one transport
//!
//! Two patterns:
//! - pub-sub: one loop per replica, each with its own subscription. Replicas
//!   progress independently; a broken subscription ends only its loop.
//! - queue: one loop pops each payload once, decodes once and waits for every
//!   replica before popping the next.
//!
//! Cancellation is observed only between messages, so a stop never leaves a
//! message half-dispatched.

use std::sync::Arc;

use codec::MutationDecoder;
use contracts::{ConsumptionPattern, ContractError, ReplicaSink, Subscription, TransportConsumer};
use dispatcher::MetricsSnapshot;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{BrokerError, LifecycleError};
use crate::handler::MessageHandler;
use crate::state::{EngineState, StateCell};
use crate::stats::EngineStatsSnapshot;

/// How a single consumption loop ended
#[derive(Debug)]
enum LoopExit {
    /// Stop signal observed
    Cancelled,
    /// Transport ended the subscription
    Closed,
    /// Transport failure
    Failed(ContractError),
}

impl LoopExit {
    fn reason(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::Closed => "closed",
            Self::Failed(_) => "transport_error",
        }
    }
}

struct EngineInner<T, S> {
    name: String,
    transport: Arc<T>,
    handler: MessageHandler<S>,
    state: StateCell,
    cancel: CancellationToken,
}

/// Relay engine bound to one transport and a fixed replica set.
///
/// One-shot: `Idle -> Running -> Stopping -> Stopped`. A stopped engine is
/// never restarted.
pub struct BrokerEngine<T, S> {
    inner: Arc<EngineInner<T, S>>,
}

/// Builder for [`BrokerEngine`]
pub struct BrokerEngineBuilder<T, S> {
    name: String,
    transport: Arc<T>,
    replicas: Vec<S>,
    decoder: MutationDecoder,
}

impl<T, S> BrokerEngineBuilder<T, S>
where
    T: TransportConsumer + 'static,
    S: ReplicaSink + Sync + 'static,
{
    /// Append one replica; order defines the replica index
    pub fn replica(mut self, replica: S) -> Self {
        self.replicas.push(replica);
        self
    }

    pub fn replicas(mut self, replicas: impl IntoIterator<Item = S>) -> Self {
        self.replicas.extend(replicas);
        self
    }

    pub fn decoder(mut self, decoder: MutationDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Build the engine; fails without replicas
    pub fn build(self) -> Result<BrokerEngine<T, S>, LifecycleError> {
        if self.replicas.is_empty() {
            return Err(LifecycleError::NoReplicas { engine: self.name });
        }

        Ok(BrokerEngine {
            inner: Arc::new(EngineInner {
                handler: MessageHandler::new(self.name.clone(), self.decoder, self.replicas),
                name: self.name,
                transport: self.transport,
                state: StateCell::new(),
                cancel: CancellationToken::new(),
            }),
        })
    }
}

impl<T, S> BrokerEngine<T, S>
where
    T: TransportConsumer + 'static,
    S: ReplicaSink + Sync + 'static,
{
    pub fn builder(name: impl Into<String>, transport: Arc<T>) -> BrokerEngineBuilder<T, S> {
        BrokerEngineBuilder {
            name: name.into(),
            transport,
            replicas: Vec::new(),
            decoder: MutationDecoder::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn state(&self) -> EngineState {
        self.inner.state.load()
    }

    pub fn replica_count(&self) -> usize {
        self.inner.handler.replica_count()
    }

    /// Consume `channel` until stopped.
    ///
    /// Resolves `Ok(())` after [`stop`](Self::stop) once every loop has
    /// exited. Resolves with [`BrokerError::Transport`] when the transport
    /// ends consumption on its own: the queue loop failing, or every
    /// pub-sub subscription ending.
    #[instrument(
        name = "broker_engine_start",
        skip(self),
        fields(engine = %self.inner.name, pattern = %pattern)
    )]
    pub async fn start(&self, channel: &str, pattern: ConsumptionPattern) -> Result<(), BrokerError> {
        let inner = &self.inner;
        inner
            .state
            .transition(EngineState::Idle, EngineState::Running)
            .map_err(|state| {
                let engine = inner.name.clone();
                match state {
                    EngineState::Running => LifecycleError::AlreadyRunning { engine },
                    _ => LifecycleError::AlreadyStopped { engine },
                }
            })?;

        info!(
            engine = %inner.name,
            channel,
            pattern = %pattern,
            replicas = inner.handler.replica_count(),
            "Broker engine started"
        );

        let result = match pattern {
            ConsumptionPattern::PubSub => Arc::clone(inner).run_pub_sub(channel).await,
            ConsumptionPattern::Queue => inner.run_queue(channel).await,
        };

        inner.cancel.cancel();
        inner.state.store(EngineState::Stopped);
        observability::record_active_loops(&inner.name, 0);

        match &result {
            Ok(()) => info!(engine = %inner.name, "Broker engine stopped"),
            Err(e) => error!(engine = %inner.name, error = %e, "Broker engine terminated"),
        }
        result
    }

    /// Signal every loop to finish its current message and exit.
    ///
    /// Returns immediately; the pending `start` resolves once the loops are
    /// gone.
    pub fn stop(&self) -> Result<(), BrokerError> {
        let inner = &self.inner;
        match inner
            .state
            .transition(EngineState::Running, EngineState::Stopping)
        {
            Ok(()) => {
                inner.cancel.cancel();
                info!(engine = %inner.name, "Stop requested");
                Ok(())
            }
            Err(state) => {
                let engine = inner.name.clone();
                let err = match state {
                    EngineState::Idle => LifecycleError::NotRunning { engine },
                    EngineState::Stopped => LifecycleError::AlreadyStopped { engine },
                    EngineState::Running | EngineState::Stopping => {
                        LifecycleError::StopAlreadyRequested { engine }
                    }
                };
                Err(err.into())
            }
        }
    }

    /// Per-replica dispatch metrics, in replica order
    pub fn replica_metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.inner.handler.replica_metrics()
    }

    pub fn stats(&self) -> EngineStatsSnapshot {
        self.inner.handler.stats()
    }
}

impl<T, S> EngineInner<T, S>
where
    T: TransportConsumer + 'static,
    S: ReplicaSink + Sync + 'static,
{
    async fn run_pub_sub(self: Arc<Self>, channel: &str) -> Result<(), BrokerError> {
        let mut loops = JoinSet::new();
        for index in 0..self.handler.replica_count() {
            let inner = Arc::clone(&self);
            let channel = channel.to_string();
            loops.spawn(async move { inner.pub_sub_loop(index, &channel).await });
        }
        observability::record_active_loops(&self.name, loops.len());

        let mut last_error = None;
        while let Some(joined) = loops.join_next().await {
            match joined {
                Ok(LoopExit::Failed(e)) => last_error = Some(e),
                Ok(_) => {}
                Err(e) => error!(engine = %self.name, error = %e, "Consumption loop panicked"),
            }
            observability::record_active_loops(&self.name, loops.len());
        }

        if self.cancel.is_cancelled() {
            return Ok(());
        }

        let source = last_error.unwrap_or_else(|| ContractError::transport_closed(channel));
        Err(BrokerError::transport(&self.name, source))
    }

    #[instrument(
        name = "broker_pub_sub_loop",
        skip(self, channel),
        fields(engine = %self.name, replica_index = index)
    )]
    async fn pub_sub_loop(&self, index: usize, channel: &str) -> LoopExit {
        let exit = self.consume_subscription(index, channel).await;
        observability::record_loop_exit(&self.name, exit.reason());
        match &exit {
            LoopExit::Cancelled => debug!(engine = %self.name, replica_index = index, "Loop stopped"),
            LoopExit::Closed => warn!(
                engine = %self.name,
                replica_index = index,
                channel,
                "Subscription closed by transport"
            ),
            LoopExit::Failed(e) => error!(
                engine = %self.name,
                replica_index = index,
                channel,
                error = %e,
                "Subscription failed"
            ),
        }
        exit
    }

    async fn consume_subscription(&self, index: usize, channel: &str) -> LoopExit {
        let subscribed = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return LoopExit::Cancelled,
            subscribed = self.transport.subscribe(channel) => subscribed,
        };
        let mut subscription = match subscribed {
            Ok(subscription) => subscription,
            Err(e) => return LoopExit::Failed(e),
        };
        debug!(engine = %self.name, replica_index = index, channel, "Subscribed");

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return LoopExit::Cancelled,
                next = subscription.next_message() => next,
            };

            match next {
                Ok(Some(payload)) => {
                    let pattern = ConsumptionPattern::PubSub.as_str();
                    if let Some(record) = self.handler.decode(pattern, Some(index), &payload) {
                        self.handler.dispatch_to(index, &record).await;
                    }
                }
                Ok(None) => return LoopExit::Closed,
                Err(e) => return LoopExit::Failed(e),
            }
        }
    }

    #[instrument(name = "broker_queue_loop", skip(self, queue), fields(engine = %self.name))]
    async fn run_queue(&self, queue: &str) -> Result<(), BrokerError> {
        observability::record_active_loops(&self.name, 1);

        let exit = loop {
            let popped = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break LoopExit::Cancelled,
                popped = self.transport.blocking_pop(queue, None) => popped,
            };

            match popped {
                Ok(Some(payload)) => {
                    let pattern = ConsumptionPattern::Queue.as_str();
                    if let Some(record) = self.handler.decode(pattern, None, &payload) {
                        self.handler.fan_out(&record).await;
                    }
                }
                // Only reachable with a pop timeout
                Ok(None) => continue,
                Err(e) => break LoopExit::Failed(e),
            }
        };

        observability::record_loop_exit(&self.name, exit.reason());
        match exit {
            LoopExit::Failed(e) => {
                error!(engine = %self.name, queue, error = %e, "Queue pop failed");
                Err(BrokerError::transport(&self.name, e))
            }
            _ => Ok(()),
        }
    }
}

//! Memory Relay Demo
//!
//! Runs both consumption patterns over the in-process transport: a queue
//! fan-out to three replicas, then a pub-sub run where one replica is slow.
//! No external services required.
//!
//! Run with: cargo run -p relay_demos --bin memory_relay

use std::sync::Arc;
use std::time::Duration;

use broker::{BrokerEngine, BrokerRegistry, RelayController};
use bytes::Bytes;
use codec::MutationDecoder;
use contracts::{Action, IndexParams, MutationRecord, TransportProducer};
use dispatcher::{LogSink, MemorySink, Replica, ReplicaKind};
use transport::MemoryTransport;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Memory Relay Demo");

    let events = demo_events()?;

    // ==== Stage 1: Queue pattern ====
    let transport = MemoryTransport::new();
    let recorders = [MemorySink::new("replica-a"), MemorySink::new("replica-b")];
    let replicas = vec![
        Replica::new("log", ReplicaKind::Log(LogSink::new("log")), None),
        Replica::new(
            "replica-a",
            ReplicaKind::Memory(recorders[0].clone()),
            Some(Duration::from_secs(1)),
        ),
        Replica::new(
            "replica-b",
            ReplicaKind::Memory(recorders[1].clone().failing_actions([Action::DropCollection])),
            Some(Duration::from_secs(1)),
        ),
    ];

    let engine = BrokerEngine::builder("memory", Arc::new(transport.clone()))
        .replicas(replicas)
        .build()?;
    let mut registry = BrokerRegistry::new();
    registry.register(Arc::new(engine))?;
    let controller = RelayController::new(registry);

    for event in &events {
        transport.push("cdc-queue", event.clone()).await?;
    }
    // Not a valid event; logged and skipped
    transport
        .push("cdc-queue", Bytes::from_static(br#"{"action":"upsert"}"#))
        .await?;

    let running = controller.clone();
    let queue_task = tokio::spawn(async move { running.start("memory", "cdc-queue", "queue").await });

    while transport.queue_len("cdc-queue") > 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    controller.stop("memory")?;
    queue_task.await??;

    let broker = controller.registry().get("memory")?;
    tracing::info!(stats = ?broker.stats(), "Queue run finished");
    for (name, metrics) in broker.replica_metrics() {
        tracing::info!(
            replica = %name,
            dispatched = metrics.dispatched,
            failed = metrics.failed,
            latency_ms = %metrics.latency_ms,
            "Replica summary"
        );
    }
    tracing::info!(calls = recorders[0].calls().len(), "replica-a recorded calls");

    // ==== Stage 2: PubSub pattern ====
    let transport = MemoryTransport::new();
    let slow = MemorySink::new("slow").with_delay(Duration::from_millis(50));
    let fast = MemorySink::new("fast");
    let engine = Arc::new(
        BrokerEngine::builder("memory-pubsub", Arc::new(transport.clone()))
            .replicas([slow.clone(), fast.clone()])
            .build()?,
    );

    let running = Arc::clone(&engine);
    let pubsub_task = tokio::spawn(async move {
        running
            .start("cdc", contracts::ConsumptionPattern::PubSub)
            .await
    });

    while transport.subscriber_count("cdc") < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    for event in &events {
        let receivers = transport.publish("cdc", event.clone()).await?;
        tracing::info!(receivers, "Event published");
    }

    while slow.calls().len() < events.len() {
        tracing::info!(
            fast = fast.calls().len(),
            slow = slow.calls().len(),
            "Replicas progressing independently"
        );
        tokio::time::sleep(Duration::from_millis(40)).await;
    }

    engine.stop()?;
    pubsub_task.await??;
    tracing::info!(stats = ?engine.stats(), "PubSub run finished");

    Ok(())
}

/// A short change stream covering every action
fn demo_events() -> Result<Vec<Bytes>, codec::DecodeError> {
    let records = [
        MutationRecord {
            dimension: 4,
            index_file_size: 1024,
            metric_type: 1,
            ..MutationRecord::new(Action::CreateCollection).with_collection("demo")
        },
        MutationRecord::new(Action::CreatePartition)
            .with_collection("demo")
            .with_partition("p0"),
        MutationRecord::new(Action::Insert)
            .with_collection("demo")
            .with_partition("p0")
            .with_id(1)
            .with_vector(vec![0.1, 0.2, 0.3, 0.4]),
        MutationRecord::new(Action::Delete)
            .with_collection("demo")
            .with_partition("p0")
            .with_id(1),
        MutationRecord {
            index_type: 2,
            index_params: Some(IndexParams::NList(128)),
            ..MutationRecord::new(Action::CreateIndex).with_collection("demo")
        },
        MutationRecord::new(Action::DropIndex).with_collection("demo"),
        MutationRecord::new(Action::DropPartition)
            .with_collection("demo")
            .with_partition("p0"),
        MutationRecord::new(Action::DropCollection).with_collection("demo"),
    ];

    records
        .iter()
        .map(|record| MutationDecoder::encode(record).map(Bytes::from))
        .collect()
}

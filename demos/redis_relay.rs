//! Redis Relay Demo
//!
//! Starts a queue relay on Redis, pushes a few events through the producer
//! side of the same transport and stops after they are applied.
//!
//! Requires a Redis server (default redis://127.0.0.1:6379, override with
//! REDIS_URL).
//!
//! Run with: cargo run -p relay_demos --bin redis_relay

use std::sync::Arc;
use std::time::Duration;

use broker::BrokerEngine;
use bytes::Bytes;
use contracts::{ConsumptionPattern, TransportProducer};
use dispatcher::MemorySink;
use transport::RedisTransport;

const QUEUE: &str = "cdc-relay-demo";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    tracing::info!(url = %url, "Starting Redis Relay Demo");

    let transport = Arc::new(RedisTransport::open(&url)?);
    let replica = MemorySink::new("recorder");
    let engine = Arc::new(
        BrokerEngine::builder("redis", Arc::clone(&transport))
            .replica(replica.clone())
            .build()?,
    );

    let running = Arc::clone(&engine);
    let task = tokio::spawn(async move { running.start(QUEUE, ConsumptionPattern::Queue).await });

    let events: [&'static [u8]; 3] = [
        br#"{"action":"create-collection","collection_name":"demo","dimension":2,"index_file_size":64,"metric_type":1}"#,
        br#"{"action":"insert","vector":"0000803f00000040","collection_name":"demo","partition_tag":"p0","id":1}"#,
        br#"{"action":"drop-collection","collection_name":"demo"}"#,
    ];
    for event in events {
        let len = transport.push(QUEUE, Bytes::from_static(event)).await?;
        tracing::info!(queue_len = len, "Event pushed");
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while replica.calls().len() < events.len() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    engine.stop()?;
    task.await??;

    for call in replica.calls() {
        tracing::info!(call = ?call, "Applied");
    }
    Ok(())
}

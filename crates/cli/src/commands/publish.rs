//! `publish` command implementation.

use anyhow::{Context, Result};
use bytes::Bytes;
use codec::MutationDecoder;
use contracts::{ConsumptionPattern, RelayConfig, TransportKind, TransportProducer};
use tracing::{info, warn};
use transport::RedisTransport;

use crate::cli::PublishArgs;
use crate::commands::load_config;
use crate::error::CliError;

/// Execute the `publish` command
pub async fn run_publish(args: &PublishArgs) -> Result<()> {
    let config = load_config(&args.config, &args.overrides)?;
    let payload = read_payload(args)?;
    check_payload(&config, &payload, args.raw)?;

    let relay = &config.relay;
    let pattern = ConsumptionPattern::parse(&relay.pattern).ok_or_else(|| {
        CliError::config_validation(format!(
            "relay.pattern '{}' is not 'pub-sub' or 'queue'",
            relay.pattern
        ))
    })?;

    let transport = config
        .transport(&relay.transport)
        .ok_or_else(|| CliError::config_validation(format!("unknown transport '{}'", relay.transport)))?;
    if transport.kind == TransportKind::Memory {
        return Err(CliError::transport_unavailable(
            &transport.name,
            "memory transports are in-process only",
        )
        .into());
    }

    let producer = RedisTransport::open(&transport.url)
        .with_context(|| format!("Failed to open transport '{}'", transport.name))?;
    send(&producer, pattern, &relay.channel, payload).await
}

async fn send<P: TransportProducer>(
    producer: &P,
    pattern: ConsumptionPattern,
    channel: &str,
    payload: Bytes,
) -> Result<()> {
    match pattern {
        ConsumptionPattern::PubSub => {
            let receivers = producer
                .publish(channel, payload)
                .await
                .context("Publish failed")?;
            if receivers == 0 {
                warn!(channel, "Published, but no subscriber received the event");
            }
            info!(channel, receivers, "Event published");
            println!("Published to '{}' ({} subscribers)", channel, receivers);
        }
        ConsumptionPattern::Queue => {
            let len = producer
                .push(channel, payload)
                .await
                .context("Push failed")?;
            info!(queue = channel, len, "Event queued");
            println!("Pushed to '{}' (queue length {})", channel, len);
        }
    }
    Ok(())
}

fn read_payload(args: &PublishArgs) -> Result<Bytes> {
    match (&args.message, &args.file) {
        (Some(message), _) => Ok(Bytes::from(message.clone())),
        (None, Some(path)) => {
            let content = std::fs::read(path)
                .with_context(|| format!("Failed to read event from {}", path.display()))?;
            Ok(Bytes::from(content))
        }
        (None, None) => Err(CliError::invalid_event("no --message or --file given").into()),
    }
}

/// Reject payloads the relay would drop, unless `raw`
fn check_payload(config: &RelayConfig, payload: &[u8], raw: bool) -> Result<()> {
    let decoder = MutationDecoder::new(config.relay.index_params);
    match decoder.decode(payload) {
        Ok(record) => {
            info!(
                action = %record.action,
                collection = %record.collection_name,
                id = record.id,
                "Event decoded"
            );
            Ok(())
        }
        Err(e) if raw => {
            warn!(error = %e, "Sending event that the relay will drop");
            Ok(())
        }
        Err(e) => Err(CliError::invalid_event(e.to_string()).into()),
    }
}

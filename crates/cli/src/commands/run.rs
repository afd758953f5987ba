//! `run` command implementation.

use anyhow::Result;
use tracing::info;

use crate::cli::RunArgs;
use crate::commands::load_config;
use crate::pipeline::{Relay, RelayOptions};

/// Execute the `run` command
pub async fn run_relay(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let config = load_config(&args.config, &args.overrides)?;

    info!(
        transport = %config.relay.transport,
        channel = %config.relay.channel,
        pattern = %config.relay.pattern,
        transports = config.transports.len(),
        replicas = config.replicas.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let relay = Relay::build(RelayOptions {
        config,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    })
    .await?;

    let stats = relay.run(shutdown_signal()).await?;
    stats.print_summary();

    info!("CDC relay finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::RelayConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Relay:");
    println!("  Transport: {}", config.relay.transport);
    println!("  Channel: {}", config.relay.channel);
    println!("  Pattern: {}", config.relay.pattern);
    println!("  Index params: {:?}", config.relay.index_params);

    println!("\nTransports ({}):", config.transports.len());
    for transport in &config.transports {
        println!("  - {} ({:?}) {}", transport.name, transport.kind, transport.url);
    }

    println!("\nReplicas ({}):", config.replicas.len());
    for (index, replica) in config.replicas.iter().enumerate() {
        println!(
            "  [{}] {} ({:?}, timeout {} ms)",
            index, replica.name, replica.sink_type, replica.timeout_ms
        );
    }

    println!();
}

//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::RelayConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::commands::load_config;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    relay: RelayInfo,
    transports: Vec<TransportInfo>,
    replicas: Vec<ReplicaInfo>,
}

#[derive(Serialize)]
struct RelayInfo {
    transport: String,
    channel: String,
    pattern: String,
    index_params: String,
}

#[derive(Serialize)]
struct TransportInfo {
    name: String,
    kind: String,
    url: String,
}

#[derive(Serialize)]
struct ReplicaInfo {
    index: usize,
    name: String,
    sink_type: String,
    timeout_ms: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = load_config(&args.config, &Default::default())?;

    if args.json {
        let info = build_config_info(&config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn build_config_info(config: &RelayConfig, args: &InfoArgs) -> ConfigInfo {
    let transports = config
        .transports
        .iter()
        .map(|t| TransportInfo {
            name: t.name.clone(),
            kind: format!("{:?}", t.kind),
            url: t.url.clone(),
        })
        .collect();

    let replicas = config
        .replicas
        .iter()
        .enumerate()
        .map(|(index, r)| ReplicaInfo {
            index,
            name: r.name.clone(),
            sink_type: format!("{:?}", r.sink_type),
            timeout_ms: r.timeout_ms,
            // Sorted for stable output
            params: if args.replicas {
                r.params.clone().into_iter().collect()
            } else {
                BTreeMap::new()
            },
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", config.version),
        relay: RelayInfo {
            transport: config.relay.transport.clone(),
            channel: config.relay.channel.clone(),
            pattern: config.relay.pattern.clone(),
            index_params: format!("{:?}", config.relay.index_params),
        },
        transports,
        replicas,
    }
}

fn print_config_info(config: &RelayConfig, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  CDC Relay Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Relay settings
    println!("📡 Relay");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Transport: {}", config.relay.transport);
    println!("   ├─ Channel: {}", config.relay.channel);
    println!("   ├─ Pattern: {}", config.relay.pattern);
    println!("   └─ Index params: {:?}", config.relay.index_params);

    // Transports
    println!("\n🔌 Transports ({})", config.transports.len());
    for (i, transport) in config.transports.iter().enumerate() {
        let is_last = i == config.transports.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        println!(
            "   {} {} ({:?}, {})",
            prefix, transport.name, transport.kind, transport.url
        );
    }

    // Replicas
    println!("\n📤 Replicas ({})", config.replicas.len());
    for (i, replica) in config.replicas.iter().enumerate() {
        let is_last = i == config.replicas.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} [{}] {} ({:?}, timeout {} ms)",
            prefix, i, replica.name, replica.sink_type, replica.timeout_ms
        );

        if args.replicas && !replica.params.is_empty() {
            let params: BTreeMap<_, _> = replica.params.iter().collect();
            for (j, (key, value)) in params.iter().enumerate() {
                let param_prefix = if j == params.len() - 1 { "└─" } else { "├─" };
                println!("   {}  {} {} = {}", child_prefix, param_prefix, key, value);
            }
        }
    }

    println!();
}

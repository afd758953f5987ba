//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ConsumptionPattern, RelayConfig, SinkType, TransportKind};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    transport: String,
    channel: String,
    pattern: String,
    transport_count: usize,
    replica_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    transport: config.relay.transport.clone(),
                    channel: config.relay.channel.clone(),
                    pattern: config.relay.pattern.clone(),
                    transport_count: config.transports.len(),
                    replica_count: config.replicas.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &RelayConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    // Rejected at start, not at load
    if ConsumptionPattern::parse(&config.relay.pattern).is_none() {
        warnings.push(format!(
            "relay.pattern '{}' is not 'pub-sub' or 'queue' - the relay will refuse to start",
            config.relay.pattern
        ));
    }

    if let Some(transport) = config.transport(&config.relay.transport) {
        if transport.kind == TransportKind::Memory {
            warnings.push(format!(
                "Transport '{}' is in-process only - no external events will arrive",
                transport.name
            ));
        }
    }

    for replica in &config.replicas {
        if replica.timeout_ms == 0 {
            warnings.push(format!(
                "Replica '{}' has no timeout - a hung replica stalls its loop",
                replica.name
            ));
        }
        if replica.sink_type == SinkType::Memory {
            warnings.push(format!(
                "Replica '{}' only records calls in memory",
                replica.name
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Transport: {}", summary.transport);
            println!("  Channel: {}", summary.channel);
            println!("  Pattern: {}", summary.pattern);
            println!("  Transports: {}", summary.transport_count);
            println!("  Replicas: {}", summary.replica_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_with_warnings() {
        let file = write_config(
            r#"
[relay]
transport = "mem"
channel = "cdc"
pattern = "fanout"

[[transports]]
name = "mem"
kind = "memory"

[[replicas]]
name = "a"
sink_type = "memory"
timeout_ms = 0
"#,
        );
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 4);
        assert!(warnings[0].contains("fanout"));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: PathBuf::from("missing.toml"),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}

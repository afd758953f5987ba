//! Command implementations.

mod info;
mod publish;
mod run;
mod validate;

pub use info::run_info;
pub use publish::run_publish;
pub use run::run_relay;
pub use validate::run_validate;

use anyhow::{Context, Result};
use contracts::RelayConfig;
use std::path::Path;

use crate::cli::RelayOverrides;
use crate::error::CliError;

/// Load configuration, apply CLI overrides and re-validate
pub(crate) fn load_config(path: &Path, overrides: &RelayOverrides) -> Result<RelayConfig> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    if apply_overrides(&mut config, overrides) {
        config_loader::ConfigLoader::validate(&config)
            .map_err(|e| CliError::config_validation(e.to_string()))?;
    }
    Ok(config)
}

/// Returns whether anything changed
fn apply_overrides(config: &mut RelayConfig, overrides: &RelayOverrides) -> bool {
    let mut changed = false;
    if let Some(ref transport) = overrides.transport {
        tracing::info!(transport = %transport, "Overriding relay transport from CLI");
        config.relay.transport = transport.clone();
        changed = true;
    }
    if let Some(ref channel) = overrides.channel {
        tracing::info!(channel = %channel, "Overriding relay channel from CLI");
        config.relay.channel = channel.clone();
        changed = true;
    }
    if let Some(ref pattern) = overrides.pattern {
        tracing::info!(pattern = %pattern, "Overriding relay pattern from CLI");
        config.relay.pattern = pattern.clone();
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = r#"
[relay]
transport = "redis"
channel = "cdc"

[[transports]]
name = "redis"
kind = "redis"

[[transports]]
name = "mem"
kind = "memory"

[[replicas]]
name = "a"
sink_type = "log"
"#;

    fn config_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_overrides_applied() {
        let file = config_file();
        let overrides = RelayOverrides {
            transport: Some("mem".into()),
            channel: None,
            pattern: Some("queue".into()),
        };
        let config = load_config(file.path(), &overrides).unwrap();
        assert_eq!(config.relay.transport, "mem");
        assert_eq!(config.relay.channel, "cdc");
        assert_eq!(config.relay.pattern, "queue");
    }

    #[test]
    fn test_override_to_unknown_transport_fails() {
        let file = config_file();
        let overrides = RelayOverrides {
            transport: Some("kafka".into()),
            ..Default::default()
        };
        let err = load_config(file.path(), &overrides).unwrap_err();
        assert!(err.to_string().contains("validation failed"), "got: {err}");
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("does-not-exist.toml"), &RelayOverrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}

//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CDC Relay - fan change events out to store replicas
#[derive(Parser, Debug)]
#[command(
    name = "cdc-relay",
    author,
    version,
    about = "Change-data-capture relay broker",
    long_about = "Consumes JSON change events from a message transport (pub-sub channel \n\
                  or work queue), decodes them and applies each mutation to every \n\
                  configured replica."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CDC_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CDC_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay until interrupted
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Send one change event to the configured transport
    Publish(PublishArgs),
}

/// Overrides for the `[relay]` section
#[derive(Args, Debug, Clone, Default)]
pub struct RelayOverrides {
    /// Override the transport to start
    #[arg(long, env = "CDC_RELAY_TRANSPORT")]
    pub transport: Option<String>,

    /// Override the channel / queue name
    #[arg(long, env = "CDC_RELAY_CHANNEL")]
    pub channel: Option<String>,

    /// Override the consumption pattern ("pub-sub" or "queue")
    #[arg(long, env = "CDC_RELAY_PATTERN")]
    pub pattern: Option<String>,
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "relay.toml", env = "CDC_RELAY_CONFIG")]
    pub config: PathBuf,

    #[command(flatten)]
    pub overrides: RelayOverrides,

    /// Validate configuration and exit without running the relay
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "CDC_RELAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show replica parameters
    #[arg(long)]
    pub replicas: bool,
}

/// Arguments for the `publish` command
#[derive(Parser, Debug)]
pub struct PublishArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml", env = "CDC_RELAY_CONFIG")]
    pub config: PathBuf,

    #[command(flatten)]
    pub overrides: RelayOverrides,

    /// Change event as inline JSON
    #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
    pub message: Option<String>,

    /// Read the change event from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Send the payload even if it does not decode
    #[arg(long)]
    pub raw: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::parse_from([
            "cdc-relay",
            "run",
            "-c",
            "relay.toml",
            "--pattern",
            "queue",
            "--channel",
            "cdc",
            "--metrics-port",
            "0",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.overrides.pattern.as_deref(), Some("queue"));
        assert_eq!(args.overrides.channel.as_deref(), Some("cdc"));
        assert_eq!(args.metrics_port, 0);
    }

    #[test]
    fn test_publish_requires_payload() {
        assert!(Cli::try_parse_from(["cdc-relay", "publish"]).is_err());
        assert!(Cli::try_parse_from([
            "cdc-relay",
            "publish",
            "--message",
            "{}",
            "--file",
            "event.json"
        ])
        .is_err());
    }
}

//! AMCP command-line client entry point.
//!
//! ```text
//! amcp-client media                      List media on the default server
//! amcp-client --server 10.0.0.5 version  Query another server
//! amcp-client --json templates           Print events as JSON lines
//! amcp-client --gen-config               Dump default config and exit
//! amcp-client --gen-config client.toml   Write default config to a file
//! ```

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use amcp_core::{AmcpError, ConnectionInfo, Device, DeviceEvent};

use amcp_client::command::{Command, render};
use amcp_client::config::{ClientConfig, LoggingConfig};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "amcp-client", about = "Talk AMCP to a playout server")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "amcp-client.toml")]
    config: PathBuf,

    /// Server address (overrides config). Example: 10.0.0.5:5250
    #[arg(short, long)]
    server: Option<String>,

    /// Print events as JSON, one per line.
    #[arg(long)]
    json: bool,

    /// Write the default configuration to PATH (stdout when omitted) and exit.
    #[arg(long, value_name = "PATH")]
    gen_config: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Option<Command>,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.gen_config {
        Some(Some(path)) => {
            ClientConfig::write_default(&path)?;
            println!("wrote default config to {}", path.display());
            return Ok(());
        }
        Some(None) => {
            let text = toml::to_string_pretty(&ClientConfig::default())?;
            println!("{text}");
            return Ok(());
        }
        None => {}
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let (mut config, config_error) = match ClientConfig::load(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (ClientConfig::default(), Some(e)),
    };
    if let Some(server) = cli.server {
        config.network.server = server;
    }

    init_tracing(&config.logging)?;
    info!("amcp-client v{}", env!("CARGO_PKG_VERSION"));
    if let Some(e) = config_error {
        warn!("invalid config {}: {e}; using defaults", cli.config.display());
    }

    let server: ConnectionInfo = config.network.server.parse()?;
    let timeout = Duration::from_millis(config.network.timeout_ms);
    let operation = command.to_operation(&config.defaults);
    debug!(?operation, "running");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut device = tokio::time::timeout(timeout, Device::connect(&server, tx))
        .await
        .map_err(|_| AmcpError::Timeout(timeout))??;

    device.submit(&operation).await?;
    print_events(&mut rx, cli.json)?;

    while !device.is_idle() {
        let alive = tokio::time::timeout(timeout, device.process_next())
            .await
            .map_err(|_| AmcpError::Timeout(timeout))??;
        print_events(&mut rx, cli.json)?;
        if !alive {
            break;
        }
    }

    Ok(())
}

fn print_events(
    rx: &mut mpsc::UnboundedReceiver<DeviceEvent>,
    json: bool,
) -> Result<(), serde_json::Error> {
    while let Ok(event) = rx.try_recv() {
        // Plain output skips the connect notice.
        if !json && event == (DeviceEvent::ConnectionStateChanged { connected: true }) {
            continue;
        }
        println!("{}", render(&event, json)?);
    }
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> std::io::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if logging.file.is_empty() {
        subscriber.with_writer(std::io::stderr).init();
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&logging.file)?;
        subscriber.with_ansi(false).with_writer(Mutex::new(file)).init();
    }
    Ok(())
}

//! Registry Daemon - Server directory and room-aware load balancer
//!
//! Backend servers report their status and rooms on the connector channel;
//! clients ask on the client channel which server should host a room.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (connector 0.0.0.0:7040, client 0.0.0.0:6090)
//! registryd
//!
//! # Load a config file and forward telemetry to a logger
//! registryd --config /etc/registry.toml --logger-addr 10.0.0.9:5454
//! ```

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use registryd::config::RegistryConfig;
use registryd::registry::spawn_registry;
use registryd::server::RegistryServer;
use registryd::telemetry::{spawn_telemetry_task, TelemetryReporter};

/// Room registry daemon
#[derive(Parser, Debug)]
#[command(name = "registryd", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address for backend server events
    #[arg(long)]
    connector_addr: Option<String>,

    /// Listen address for client lookups
    #[arg(long)]
    client_addr: Option<String>,

    /// Address of the telemetry logger
    #[arg(long)]
    logger_addr: Option<String>,
}

impl Args {
    /// Applies command-line overrides on top of the loaded configuration.
    fn apply(self, mut config: RegistryConfig) -> Result<RegistryConfig> {
        if let Some(addr) = self.connector_addr {
            config.connector_addr = addr;
        }
        if let Some(addr) = self.client_addr {
            config.client_addr = addr;
        }
        if let Some(addr) = self.logger_addr {
            config.logger_addr = Some(addr);
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = RegistryConfig::load(args.config.as_deref()).context("loading configuration")?;
    let config = args.apply(config)?;

    run_daemon(config)
}

#[tokio::main]
async fn run_daemon(config: RegistryConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("registryd=info".parse()?)
                .add_directive("registry_core=info".parse()?)
                .add_directive("registry_protocol=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        name = %config.name,
        "Registry daemon starting"
    );

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let registry = spawn_registry();
    info!("Server registry started");

    let reporter = TelemetryReporter::new(config.name.clone(), config.logger_addr.clone());
    let telemetry_handle = spawn_telemetry_task(
        registry.clone(),
        reporter,
        config.log_interval(),
        cancel_token.clone(),
    );

    let server = RegistryServer::bind(
        &config.connector_addr,
        &config.client_addr,
        registry,
        cancel_token.clone(),
    )
    .await?;

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        cancel_token.cancel();
        return Err(e.into());
    }

    let _ = telemetry_handle.await;

    info!("Registry daemon stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}

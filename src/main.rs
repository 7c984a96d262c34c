//! MindWave bridge - ThinkGear serial decoder
//!
//! Usage:
//!   mw-bridge                        Decode to the console (port auto-detected)
//!   mw-bridge --port /dev/rfcomm0    Use an explicit port
//!   mw-bridge -o session.csv         Record to a rotating CSV file
//!   mw-bridge list-ports             List serial ports and exit

use anyhow::{Context, Result};
use clap::Parser;
use mindwave_bridge::bridge::{self, Stats};
use mindwave_bridge::cli::{Cli, Command};
use mindwave_bridge::config::{self, Config};
use mindwave_bridge::logging;
use mindwave_bridge::transport::serial::{describe, SerialTransport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = config::load(cli.config.as_deref());
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default(),
    };
    logging::init_tracing(cli.verbose, &config.logs.level);
    if let Err(e) = loaded {
        warn!("{}, using defaults", e);
    }

    if let Some(Command::ListPorts) = cli.command {
        return list_ports();
    }

    cli.apply(&mut config);
    config.validate()?;

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    rt.block_on(run(config))
}

fn list_ports() -> Result<()> {
    let ports = SerialTransport::available()?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in &ports {
        println!("{}", describe(port));
    }
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    // Setup shutdown handler
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate()).context("SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt()).context("SIGINT handler")?;
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
            shutdown_clone.store(true, Ordering::SeqCst);
        });
    }

    #[cfg(windows)]
    {
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown_clone.store(true, Ordering::SeqCst);
        });
    }

    let stats = Arc::new(Stats::new());
    bridge::run(&config, shutdown, stats).await?;
    Ok(())
}

//! # Ledger Node
//!
//! `main` stays synchronous so that `--daemon` can fork before tokio starts
//! any worker thread; the runtime is built by hand afterwards.

use anyhow::{Context, Result};
use clap::Parser;
use ledger_telemetry::{init_logging, TelemetryConfig};
use node_runtime::daemon::{self, WorkdirLock};
use node_runtime::{Cli, NodeRuntime};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.kill {
        let pid = daemon::kill_daemon(&cli.pid_file).context("Failed to stop the node")?;
        println!("Sent SIGTERM to {pid}");
        return Ok(());
    }

    if cli.daemon {
        daemon::daemonize().context("Failed to daemonize")?;
    }

    let _lock = WorkdirLock::acquire(&cli.workingdir)?;
    daemon::write_pid_file(&cli.pid_file)?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to build tokio runtime")?;
    let result = runtime.block_on(run(&cli));

    daemon::remove_pid_file(&cli.pid_file);
    result
}

async fn run(cli: &Cli) -> Result<()> {
    let mut telemetry = TelemetryConfig::from_env();
    if let Some(log_file) = &cli.log_file {
        telemetry = telemetry.with_log_file(log_file.clone());
    }
    init_logging(&telemetry)?;

    let mut node = NodeRuntime::new(cli)?;
    node.start().await?;

    wait_for_signal().await?;
    node.shutdown().await;
    Ok(())
}

async fn wait_for_signal() -> Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = interrupt.recv() => info!("SIGINT received"),
        _ = terminate.recv() => info!("SIGTERM received"),
    }
    Ok(())
}

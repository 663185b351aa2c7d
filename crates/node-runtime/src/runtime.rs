//! # Node Runtime
//!
//! Owns the core service for the lifetime of the process: loads the
//! configuration, creates every configured domain, runs the TCP server and
//! persists the configuration on shutdown.

use anyhow::{Context, Result};
use dl_05_core_service::{ConfigStore, CoreServer, CoreService, JsonConfigStore, ServiceError};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::cli::Cli;

pub struct NodeRuntime {
    service: Arc<CoreService>,
    config: Arc<JsonConfigStore>,
    server: Option<JoinHandle<Result<(), ServiceError>>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    pub fn new(cli: &Cli) -> Result<Self> {
        let store = JsonConfigStore::load(
            &cli.workingdir,
            cli.config.as_deref(),
            cli.default_config.as_deref(),
        )
        .context("Failed to load configuration")?;
        store.update_client(|client| cli.apply_to(client));
        let config = Arc::new(store);

        let service =
            CoreService::bootstrap(config.clone()).context("Failed to start core service")?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            service,
            config,
            server: None,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Bind the client port and start accepting. Returns the bound address.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let client = self.config.get_config().client;
        let server = CoreServer::bind(self.service.clone(), &client)
            .await
            .context("Failed to open client port")?;
        let addr = server.local_addr()?;
        self.server = Some(tokio::spawn(server.run(self.shutdown_rx.clone())));

        info!(
            %addr,
            config = %self.config.path().display(),
            domains = self.service.registry().len(),
            "Ledger node running"
        );
        Ok(addr)
    }

    pub fn service(&self) -> &Arc<CoreService> {
        &self.service
    }

    /// Stop accepting, persist the configuration and close every domain.
    pub async fn shutdown(mut self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!(error = %e, "Failed to send shutdown signal");
        }
        if let Some(server) = self.server.take() {
            match server.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "Server stopped with an error"),
                Err(e) => error!(error = %e, "Server task failed"),
            }
        }
        self.service.shutdown();
        info!("Shutdown complete");
    }
}

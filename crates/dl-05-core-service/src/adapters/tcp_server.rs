//! # TCP Server
//!
//! Accept loop bounded by a connection pool. A permit is taken before each
//! `accept` and travels with the connection task, so at most `pool_size`
//! clients are served at once; further clients wait in the listen backlog.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info};

use super::connection::handle_connection;
use crate::domain::{ClientConfig, ServiceError};
use crate::service::CoreService;

pub struct CoreServer {
    service: Arc<CoreService>,
    listener: TcpListener,
    pool: Arc<Semaphore>,
}

impl CoreServer {
    /// Bind the wildcard address of the configured family.
    pub async fn bind(service: Arc<CoreService>, config: &ClientConfig) -> Result<Self, ServiceError> {
        let addr = if config.use_ipv6 {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, config.port))
        } else {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port))
        };
        Self::bind_addr(service, addr, config.pool_size).await
    }

    pub async fn bind_addr(
        service: Arc<CoreService>,
        addr: SocketAddr,
        pool_size: usize,
    ) -> Result<Self, ServiceError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServiceError::Bind { addr, source })?;
        info!(addr = %listener.local_addr()?, pool_size, "Core server listening");
        Ok(Self {
            service,
            listener,
            pool: Arc::new(Semaphore::new(pool_size.max(1))),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServiceError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` flips to `true`. Connections already accepted
    /// keep running on their own tasks.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), ServiceError> {
        loop {
            let permit = tokio::select! {
                permit = self.pool.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = shutdown.changed() => break,
            };

            let (stream, peer) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                        continue;
                    }
                },
                _ = shutdown.changed() => break,
            };
            debug!(%peer, "Connection accepted");

            let service = self.service.clone();
            tokio::spawn(async move {
                handle_connection(service, stream, peer).await;
                drop(permit);
            });
        }
        info!("Core server stopped accepting");
        Ok(())
    }
}

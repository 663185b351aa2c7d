//! # Core Service
//!
//! The context object every connection task shares. It owns no sockets;
//! it bundles the domain registry, the statistics recorder, the broadcast
//! collaborator and the config store, and implements the protocol
//! operations on top of them.
//!
//! | File | Operations |
//! |------|------------|
//! | `admission.rs` | `insert_transaction` |
//! | `search.rs` | `search_transaction_by_txid`, `search_transaction_with_condition`, `count_transactions` |
//! | `traversal.rs` | `traverse_transactions` |
//! | `gathering.rs` | `distribute_transaction_to_gather_signatures`, `relay_signature_response` |
//! | `dispatcher.rs` | `dispatch` (command table) |

mod admission;
mod dispatcher;
mod gathering;
mod search;
mod traversal;

pub use dispatcher::{ConnectionContext, Flow};
pub use search::{SearchResult, TxidSearch};
pub use traversal::{TraversalQuery, TraversalResult, DIRECTION_PAST, TX_TRAVERSAL_MAX};

use dl_03_ledger_storage::MemoryStorageFactory;
use dl_04_domain_registry::{DomainConfig, DomainRegistry};
use ledger_telemetry::Stats;
use shared_bus::InMemoryEventBus;
use shared_types::{DomainId, Identifier, NodeId};
use std::sync::Arc;
use tracing::{info, warn};

use crate::adapters::BusBroadcaster;
use crate::domain::ServiceError;
use crate::ports::{ConfigStore, NotificationBroadcaster};

pub struct CoreService {
    registry: Arc<DomainRegistry>,
    stats: Stats,
    broadcaster: Arc<dyn NotificationBroadcaster>,
    config: Arc<dyn ConfigStore>,
}

impl CoreService {
    pub fn new(
        registry: Arc<DomainRegistry>,
        stats: Stats,
        broadcaster: Arc<dyn NotificationBroadcaster>,
        config: Arc<dyn ConfigStore>,
    ) -> Self {
        Self {
            registry,
            stats,
            broadcaster,
            config,
        }
    }

    /// Wire the in-memory collaborators and create every configured domain.
    pub fn bootstrap(config: Arc<dyn ConfigStore>) -> Result<Arc<Self>, ServiceError> {
        let bus = Arc::new(InMemoryEventBus::new());
        let registry = Arc::new(DomainRegistry::new(
            Arc::new(MemoryStorageFactory),
            bus.clone(),
        ));
        let service = Self::new(
            registry,
            Stats::new()?,
            Arc::new(BusBroadcaster::new(bus)),
            config,
        );

        for (domain_id, domain_config) in service.config.domains()? {
            let domain = service.registry.create_domain(domain_id, domain_config.clone())?;
            service.remember_domain(&domain_id, domain_config, domain.node_id());
        }
        info!(domains = service.registry.len(), "Core service ready");
        Ok(Arc::new(service))
    }

    pub fn registry(&self) -> &Arc<DomainRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn config(&self) -> &Arc<dyn ConfigStore> {
        &self.config
    }

    /// Persist the configuration and release every domain.
    pub fn shutdown(&self) {
        if let Err(e) = self.config.update_config() {
            warn!(error = %e, "Failed to persist configuration");
        }
        self.registry.shutdown();
    }

    /// Record the domain in the config store with the node id in use.
    fn remember_domain(
        &self,
        domain_id: &DomainId,
        mut config: DomainConfig,
        node_id: &NodeId,
    ) {
        config.node_id = Some(node_id.to_hex());
        self.config.set_domain(domain_id, config);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::JsonConfigStore;
    use crate::domain::CoreConfig;
    use async_trait::async_trait;
    use dl_02_transaction_format::{Asset, Transaction, TransactionBuilder};
    use dl_04_domain_registry::ConnectionHandle;
    use parking_lot::Mutex;
    use shared_crypto::Ed25519KeyPair;
    use shared_types::{AssetGroupId, Message, TransactionId, UserId};
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    pub const DOMAIN: DomainId = DomainId::new([0xD0; 32]);

    pub fn group(n: u8) -> AssetGroupId {
        AssetGroupId::new([n; 32])
    }

    pub fn user(n: u8) -> UserId {
        UserId::new([n; 32])
    }

    /// Signed transaction with one event owned by `user(u)` in `group(g)`.
    pub fn signed_tx(g: u8, u: u8) -> Transaction {
        signed_tx_at(g, u, 0)
    }

    pub fn signed_tx_at(g: u8, u: u8, timestamp: i64) -> Transaction {
        linked_tx(g, u, timestamp, &[])
    }

    /// Like [`signed_tx_at`], referencing each of `parents`.
    pub fn linked_tx(g: u8, u: u8, timestamp: i64, parents: &[TransactionId]) -> Transaction {
        let nonce = [&[g, u][..], &timestamp.to_be_bytes()].concat();
        let mut builder = TransactionBuilder::new()
            .timestamp(timestamp)
            .event(group(g), Asset::new(user(u), nonce, b"asset".to_vec()))
            .witness(user(u));
        for parent in parents {
            builder = builder.reference(group(g), *parent, 0);
        }
        let mut tx = builder.build().unwrap();
        tx.sign(user(u), &Ed25519KeyPair::from_seed([u; 32]));
        tx
    }

    /// Records every broadcast, then forwards it to the bus.
    pub struct RecordingBroadcaster {
        inner: BusBroadcaster,
        sent: Mutex<Vec<(DomainId, Vec<u8>)>>,
    }

    #[async_trait]
    impl NotificationBroadcaster for RecordingBroadcaster {
        async fn broadcast_notification(&self, domain_id: &DomainId, payload: Vec<u8>) {
            self.sent.lock().push((*domain_id, payload.clone()));
            self.inner.broadcast_notification(domain_id, payload).await;
        }
    }

    pub struct Fixture {
        pub service: Arc<CoreService>,
        pub broadcaster: Arc<RecordingBroadcaster>,
    }

    impl Fixture {
        pub fn broadcasts(&self) -> Vec<(DomainId, Vec<u8>)> {
            self.broadcaster.sent.lock().clone()
        }
    }

    /// Service hosting [`DOMAIN`] with in-memory storage and an unsaved config.
    pub fn fixture() -> Fixture {
        let bus = Arc::new(InMemoryEventBus::new());
        let registry = Arc::new(DomainRegistry::new(Arc::new(MemoryStorageFactory), bus.clone()));
        registry.create_domain(DOMAIN, DomainConfig::default()).unwrap();

        let broadcaster = Arc::new(RecordingBroadcaster {
            inner: BusBroadcaster::new(bus),
            sent: Mutex::new(Vec::new()),
        });
        let config = Arc::new(JsonConfigStore::new(
            PathBuf::from("unused-config.json"),
            CoreConfig::default(),
        ));
        let service = CoreService::new(registry, Stats::new().unwrap(), broadcaster.clone(), config);
        Fixture {
            service: Arc::new(service),
            broadcaster,
        }
    }

    pub fn connection() -> (ConnectionContext, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(64);
        let peer = "127.0.0.1:40000".parse().unwrap();
        (ConnectionContext::new(ConnectionHandle::new(tx), peer), rx)
    }

    /// A user registered in [`DOMAIN`] straight through the routing table.
    pub struct Registered {
        pub rx: mpsc::Receiver<Message>,
    }

    pub fn register(fx: &Fixture, n: u8) -> Registered {
        let (tx, rx) = mpsc::channel(64);
        fx.service
            .registry()
            .routing_for(&DOMAIN)
            .register_user(user(n), ConnectionHandle::new(tx), false);
        Registered { rx }
    }

    #[tokio::test]
    async fn test_bootstrap_creates_configured_domains() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CoreConfig::default();
        config.set_domain(&DOMAIN, DomainConfig::default());
        let store = Arc::new(JsonConfigStore::new(dir.path().join("config.json"), config));

        let service = CoreService::bootstrap(store.clone()).unwrap();
        assert!(service.registry().contains(&DOMAIN));
        let node_id = service.registry().get(&DOMAIN).unwrap().node_id().to_hex();
        let persisted = store.get_config().domains[&DOMAIN.to_hex()].clone();
        assert_eq!(persisted.node_id, Some(node_id));

        service.shutdown();
        assert!(service.registry().is_empty());
        assert!(dir.path().join("config.json").exists());
    }

    #[tokio::test]
    async fn test_insert_notifies_subscriber_through_bus() {
        let fx = fixture();
        let mut subscriber = register(&fx, 5);
        fx.service
            .registry()
            .routing_for(&DOMAIN)
            .register_notification(group(1), user(5));

        let tx = signed_tx(1, 1);
        fx.service
            .insert_transaction(&DOMAIN, &tx.serialize().unwrap())
            .await
            .unwrap();

        let msg = tokio::time::timeout(std::time::Duration::from_secs(2), subscriber.rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(msg.command(), Some(shared_types::Command::NotifyInserted));
        assert_eq!(
            msg.id::<TransactionId>(shared_types::KeyType::TransactionId).unwrap(),
            Some(tx.transaction_id)
        );
    }
}

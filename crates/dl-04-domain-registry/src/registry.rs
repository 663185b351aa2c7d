//! # Domain Registry
//!
//! Owns the hosted domains. Each domain bundles a storage handle, a routing
//! table and a bus subscription that turns insertion notifications into
//! `NOTIFY_INSERTED` messages for subscribed users.

use dl_03_ledger_storage::{LedgerStorage, StorageFactory};
use parking_lot::RwLock;
use shared_bus::{DomainEvent, EventFilter, InMemoryEventBus};
use shared_types::{DomainId, Identifier, NodeId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::adapters::{DummyRoutingTable, UserRoutingTable};
use crate::domain::{decode_inserted_notification, DomainConfig, RegistryError};
use crate::ports::UserRouting;

/// One hosted domain.
pub struct Domain {
    domain_id: DomainId,
    node_id: NodeId,
    name: String,
    config: DomainConfig,
    storage: Arc<dyn LedgerStorage>,
    routing: Arc<UserRoutingTable>,
    notifier: Option<JoinHandle<()>>,
}

impl Domain {
    pub fn domain_id(&self) -> &DomainId {
        &self.domain_id
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &DomainConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn LedgerStorage> {
        &self.storage
    }

    pub fn routing(&self) -> Arc<dyn UserRouting> {
        self.routing.clone()
    }

    fn shutdown(&self) {
        if let Some(notifier) = &self.notifier {
            notifier.abort();
        }
        self.routing.close();
        self.storage.close();
    }
}

impl std::fmt::Debug for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Domain")
            .field("domain_id", &self.domain_id)
            .field("node_id", &self.node_id)
            .field("name", &self.name)
            .finish()
    }
}

/// Registry of hosted domains, shared by every connection task.
pub struct DomainRegistry {
    domains: RwLock<BTreeMap<DomainId, Arc<Domain>>>,
    storage_factory: Arc<dyn StorageFactory>,
    bus: Arc<InMemoryEventBus>,
}

impl DomainRegistry {
    pub fn new(storage_factory: Arc<dyn StorageFactory>, bus: Arc<InMemoryEventBus>) -> Self {
        Self {
            domains: RwLock::new(BTreeMap::new()),
            storage_factory,
            bus,
        }
    }

    /// Bus the registry's notification tasks listen on.
    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    /// Host a new domain.
    ///
    /// Fails with [`RegistryError::AlreadyExists`] when the id is taken.
    /// Outside a tokio runtime the domain is created without notification
    /// fan-out.
    pub fn create_domain(
        &self,
        domain_id: DomainId,
        config: DomainConfig,
    ) -> Result<Arc<Domain>, RegistryError> {
        let mut domains = self.domains.write();
        if domains.contains_key(&domain_id) {
            return Err(RegistryError::AlreadyExists(domain_id));
        }

        let node_id = config.resolve_node_id()?;
        let name = config.resolve_name(&node_id);
        let storage = self.storage_factory.open(&domain_id, &config.storage)?;
        let routing = Arc::new(UserRoutingTable::new(domain_id));
        let notifier = self.spawn_notifier(domain_id, routing.clone());

        let domain = Arc::new(Domain {
            domain_id,
            node_id,
            name,
            config,
            storage,
            routing,
            notifier,
        });
        domains.insert(domain_id, domain.clone());

        info!(
            domain = %domain_id.short(),
            node = %node_id.short(),
            name = %domain.name,
            "Domain created"
        );
        Ok(domain)
    }

    /// Stop hosting a domain: closes its routing table and storage handle
    /// and stops its notification task.
    pub fn remove_domain(&self, domain_id: &DomainId) -> Result<(), RegistryError> {
        let domain = self
            .domains
            .write()
            .remove(domain_id)
            .ok_or(RegistryError::NoSuchDomain(*domain_id))?;
        domain.shutdown();
        info!(domain = %domain_id.short(), "Domain removed");
        Ok(())
    }

    pub fn get(&self, domain_id: &DomainId) -> Option<Arc<Domain>> {
        self.domains.read().get(domain_id).cloned()
    }

    pub fn contains(&self, domain_id: &DomainId) -> bool {
        self.domains.read().contains_key(domain_id)
    }

    /// The domain's routing table, or the null-object table for domains this
    /// node does not host.
    pub fn routing_for(&self, domain_id: &DomainId) -> Arc<dyn UserRouting> {
        match self.get(domain_id) {
            Some(domain) => domain.routing(),
            None => Arc::new(DummyRoutingTable::new(*domain_id)),
        }
    }

    /// Hosted domain ids, ordered.
    pub fn domain_ids(&self) -> Vec<DomainId> {
        self.domains.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.domains.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every domain.
    pub fn shutdown(&self) {
        let drained = std::mem::take(&mut *self.domains.write());
        for domain in drained.values() {
            domain.shutdown();
        }
        debug!(domains = drained.len(), "Registry shut down");
    }

    fn spawn_notifier(
        &self,
        domain_id: DomainId,
        routing: Arc<UserRoutingTable>,
    ) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(domain = %domain_id.short(), "No runtime, insert notifications disabled");
            return None;
        };

        // Subscribe before spawning so nothing published after creation is missed.
        let mut subscription = self.bus.subscribe(EventFilter::domain(domain_id));
        Some(runtime.spawn(async move {
            while let Some(event) = subscription.recv().await {
                let DomainEvent::TransactionInserted { payload, .. } = event;
                match decode_inserted_notification(&payload) {
                    Ok(notification) => routing.notify_inserted(&notification).await,
                    Err(e) => warn!(domain = %domain_id.short(), error = %e, "Dropping notification"),
                }
            }
            debug!(domain = %domain_id.short(), "Notification task finished");
        }))
    }
}

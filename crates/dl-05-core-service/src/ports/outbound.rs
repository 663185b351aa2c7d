//! # Outbound Ports (Driven Ports)
//!
//! Collaborators the core service calls out to.

use async_trait::async_trait;
use dl_04_domain_registry::DomainConfig;
use shared_types::DomainId;

use crate::domain::{ConfigError, CoreConfig};

/// Delivers insertion notifications to every party interested in a domain.
#[async_trait]
pub trait NotificationBroadcaster: Send + Sync {
    async fn broadcast_notification(&self, domain_id: &DomainId, payload: Vec<u8>);
}

/// Persistent node configuration.
pub trait ConfigStore: Send + Sync {
    fn get_config(&self) -> CoreConfig;

    /// Current configuration as JSON text.
    fn get_json_config(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(&self.get_config())?)
    }

    fn domains(&self) -> Result<Vec<(DomainId, DomainConfig)>, ConfigError> {
        self.get_config().domain_entries()
    }

    fn set_domain(&self, domain_id: &DomainId, config: DomainConfig);

    fn remove_domain(&self, domain_id: &DomainId);

    /// Write the configuration to its backing store.
    fn update_config(&self) -> Result<(), ConfigError>;
}

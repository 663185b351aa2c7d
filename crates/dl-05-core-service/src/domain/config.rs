//! # Node Configuration
//!
//! Shape of `<workingdir>/config.json`:
//!
//! ```json
//! {
//!   "client": { "port": 9000, "use_ipv6": false, "pool_size": 1000 },
//!   "domains": {
//!     "<hex domain id>": { "name": "alpha", "node_id": "<hex>", "storage": { "type": "memory" } }
//!   }
//! }
//! ```

use dl_04_domain_registry::DomainConfig;
use serde::{Deserialize, Serialize};
use shared_types::{DomainId, Identifier};
use std::collections::BTreeMap;

use super::errors::ConfigError;

pub const DEFAULT_CORE_PORT: u16 = 9000;
pub const DEFAULT_POOL_SIZE: usize = 1000;

/// Listener settings. Command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub port: u16,
    pub use_ipv6: bool,
    /// Ceiling on concurrently served connections.
    pub pool_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_CORE_PORT,
            use_ipv6: false,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub client: ClientConfig,
    /// Hosted domains keyed by hex domain id.
    pub domains: BTreeMap<String, DomainConfig>,
}

impl CoreConfig {
    /// Configured domains with parsed ids.
    pub fn domain_entries(&self) -> Result<Vec<(DomainId, DomainConfig)>, ConfigError> {
        self.domains
            .iter()
            .map(|(key, config)| {
                DomainId::from_hex(key)
                    .map(|id| (id, config.clone()))
                    .map_err(|_| ConfigError::InvalidDomainId(key.clone()))
            })
            .collect()
    }

    pub fn set_domain(&mut self, domain_id: &DomainId, config: DomainConfig) {
        self.domains.insert(domain_id.to_hex(), config);
    }

    pub fn remove_domain(&mut self, domain_id: &DomainId) -> Option<DomainConfig> {
        self.domains.remove(&domain_id.to_hex())
    }
}

//! # Per-Domain Configuration
//!
//! One entry of the `domains` table in the node configuration file.

use dl_03_ledger_storage::StorageConfig;
use serde::{Deserialize, Serialize};
use shared_types::{Identifier, NodeId};

use super::errors::RegistryError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    /// Display name. Derived from the node id when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Hex node id. Generated when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub storage: StorageConfig,
}

impl DomainConfig {
    /// Configured node id, or a fresh random one.
    pub fn resolve_node_id(&self) -> Result<NodeId, RegistryError> {
        match &self.node_id {
            Some(hex) => NodeId::from_hex(hex).map_err(RegistryError::InvalidNodeId),
            None => Ok(NodeId::new(rand::random())),
        }
    }

    pub fn resolve_name(&self, node_id: &NodeId) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("node-{}", node_id.short()))
    }
}

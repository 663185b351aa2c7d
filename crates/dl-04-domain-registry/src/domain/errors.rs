//! # Registry Errors

use dl_03_ledger_storage::StorageError;
use shared_types::{DomainId, IdError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Domain {0} already exists")]
    AlreadyExists(DomainId),

    #[error("No such domain: {0}")]
    NoSuchDomain(DomainId),

    #[error("Invalid node id in domain config: {0}")]
    InvalidNodeId(#[source] IdError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Malformed insertion notification: {0}")]
    MalformedNotification(String),
}

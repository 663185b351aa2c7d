//! # Storage Errors

use shared_types::TransactionId;
use thiserror::Error;

/// Errors raised by a storage engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// A transaction with this id is already stored.
    #[error("Transaction {0} already exists")]
    Duplicate(TransactionId),

    /// The handle was detached from its domain.
    #[error("Storage is closed")]
    Closed,
}

//! # Transaction Errors

use thiserror::Error;

/// Errors raised by the transaction format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// Bytes are not a well-formed serialized transaction.
    #[error("Malformed transaction: {0}")]
    Malformed(String),

    /// Encoding the object failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

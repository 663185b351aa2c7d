//! # Error Types
//!
//! Protocol status codes and the identifier parsing error.

use thiserror::Error;

/// Status codes carried in the `status` key of every response.
///
/// `0` is success; every failure is negative. A relayed status is considered
/// an error when it is strictly below [`status::ESUCCESS`].
pub mod status {
    pub const ESUCCESS: i64 = 0;
    /// Generic failure (e.g. a relayed response that carried no status).
    pub const EOTHER: i64 = -1;
    /// Malformed or incomplete command, unknown routing target.
    pub const EINVALID_COMMAND: i64 = -2;
    /// Search or traversal found nothing.
    pub const ENOTRANSACTION: i64 = -3;
    /// Found, but the stored object does not match its id.
    pub const EBADTRANSACTION: i64 = -4;
}

/// Errors raised while building an identifier from untrusted bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// Byte length differs from the fixed identifier length.
    #[error("Invalid {kind} length: expected {expected}, got {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Hex string could not be decoded.
    #[error("Invalid {kind} hex encoding")]
    InvalidHex { kind: &'static str },
}

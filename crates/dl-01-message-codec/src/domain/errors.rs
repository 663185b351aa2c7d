//! # Codec Errors

use shared_types::KeyType;
use thiserror::Error;

/// Errors raised while framing or parsing.
///
/// Only [`CodecError::FrameTooLarge`] and [`CodecError::Io`] escape the
/// stream decoder; payload-level errors drop the offending frame.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Header announces a payload above the configured limit.
    #[error("Frame too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: usize },

    /// Payload ended in the middle of an entry.
    #[error("Truncated payload while reading {what}")]
    Truncated { what: &'static str },

    /// Value bytes do not fit the key's declared kind.
    #[error("Malformed value for key {key}: {detail}")]
    MalformedValue { key: KeyType, detail: &'static str },

    /// Message holds a value of the wrong kind for its key.
    #[error("Cannot encode key {key}: value kind does not match")]
    KindMismatch { key: KeyType },

    /// Value or list longer than a `u32` length prefix can express.
    #[error("Value for key {key} too long to encode")]
    ValueTooLong { key: KeyType },

    /// Transport error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

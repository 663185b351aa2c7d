//! # Core Service Errors
//!
//! | Error | Raised by | Surfaces as |
//! |-------|-----------|-------------|
//! | `AdmissionError` | transaction admission | `reason` text of an `EINVALID_COMMAND` reply |
//! | `ConfigError` | config store | startup failure / logged on persist |
//! | `ServiceError` | server, bootstrap | process exit |

use dl_01_message_codec::CodecError;
use dl_04_domain_registry::RegistryError;
use ledger_telemetry::TelemetryError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a transaction was not admitted. The display strings are sent to
/// clients verbatim.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Set up the domain, first!")]
    NoSuchDomain,

    #[error("Bad transaction format")]
    BadTransaction,

    #[error("Failed to insert a transaction into the ledger")]
    StoreFailed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Invalid domain id in config: {0}")]
    InvalidDomainId(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_reasons_are_wire_strings() {
        assert_eq!(AdmissionError::NoSuchDomain.to_string(), "Set up the domain, first!");
        assert_eq!(AdmissionError::BadTransaction.to_string(), "Bad transaction format");
        assert_eq!(
            AdmissionError::StoreFailed.to_string(),
            "Failed to insert a transaction into the ledger"
        );
    }
}

//! Domain layer: configuration, reply construction and errors.

pub mod config;
pub mod errors;
pub mod reply;

pub use config::{ClientConfig, CoreConfig, DEFAULT_CORE_PORT, DEFAULT_POOL_SIZE};
pub use errors::{AdmissionError, ConfigError, ServiceError};
pub use reply::{base_reply, set_error, REASON_INVALID_PARAMS, REASON_MISSING_PARAMS};

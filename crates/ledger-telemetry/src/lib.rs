//! # Ledger Telemetry
//!
//! Logging initialisation and the process-wide statistics recorder.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_logging, Stats, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//!
//! let stats = Stats::new()?;
//! stats.update_stats_increment("client", "total_num", 1);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DL_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `DL_JSON_LOGS` | `false` | Emit JSON formatted logs |
//! | `DL_SERVICE_NAME` | `ledger-node` | Service name in the startup line |

mod config;
mod logging;
mod stats;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use stats::{Stats, StatsSnapshot};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to initialize statistics registry: {0}")]
    StatsInit(#[from] prometheus::Error),
}

//! # Ledger Node Runtime
//!
//! Process surface of the ledger node. The binary in `main.rs` is a thin
//! shell over these modules:
//!
//! | Module | Concern |
//! |--------|---------|
//! | [`cli`] | command-line flags |
//! | [`daemon`] | double-fork, pid file, `--kill`, working directory lock |
//! | [`runtime`] | configuration, core service and TCP server lifecycle |
//!
//! ## Startup Sequence
//!
//! 1. Parse flags; `--kill` stops a running daemon and exits
//! 2. Daemonize (before any tokio thread exists)
//! 3. Lock the working directory, write the pid file
//! 4. Load configuration, create every configured domain
//! 5. Serve until SIGINT/SIGTERM, then persist configuration

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod cli;
pub mod daemon;
pub mod runtime;

pub use cli::Cli;
pub use daemon::{DaemonError, WorkdirLock};
pub use runtime::NodeRuntime;

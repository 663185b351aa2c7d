//! Command-line flags.

use clap::Parser;
use dl_05_core_service::{ClientConfig, DEFAULT_CORE_PORT};
use std::path::PathBuf;

pub const DEFAULT_WORKINGDIR: &str = ".bbc1";
pub const DEFAULT_PID_FILE: &str = "/tmp/ledger-node.pid";

#[derive(Debug, Clone, Parser)]
#[command(name = "ledger-node", version, about = "Core node of a permissioned distributed ledger")]
pub struct Cli {
    /// TCP port clients connect to.
    #[arg(short = 'p', long = "coreport", default_value_t = DEFAULT_CORE_PORT)]
    pub coreport: u16,

    /// Directory holding the configuration and the lock file.
    #[arg(short = 'w', long = "workingdir", default_value = DEFAULT_WORKINGDIR)]
    pub workingdir: PathBuf,

    /// Configuration file, relative to the working directory unless absolute.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Configuration used when no configuration file exists yet.
    #[arg(long = "default-config")]
    pub default_config: Option<PathBuf>,

    /// Write logs to this file instead of stdout.
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Listen on IPv6.
    #[arg(short = '6', long = "ipv6")]
    pub ipv6: bool,

    /// Detach from the terminal.
    #[arg(short = 'd', long = "daemon")]
    pub daemon: bool,

    /// Stop the running daemon and exit.
    #[arg(short = 'k', long = "kill")]
    pub kill: bool,

    /// Maximum number of clients served at once.
    #[arg(long = "pool-size")]
    pub pool_size: Option<usize>,

    #[arg(long = "pid-file", default_value = DEFAULT_PID_FILE)]
    pub pid_file: PathBuf,
}

impl Cli {
    /// Apply the listener flags on top of the configured values.
    pub fn apply_to(&self, client: &mut ClientConfig) {
        client.port = self.coreport;
        client.use_ipv6 |= self.ipv6;
        if let Some(pool_size) = self.pool_size {
            client.pool_size = pool_size;
        }
    }
}

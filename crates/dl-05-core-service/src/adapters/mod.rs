//! Adapters layer: TCP front end, bus broadcaster and JSON config store.

pub mod bus_broadcaster;
pub mod connection;
pub mod json_config;
pub mod tcp_server;

pub use bus_broadcaster::BusBroadcaster;
pub use connection::{handle_connection, OUTBOUND_QUEUE_CAPACITY};
pub use json_config::{JsonConfigStore, CONFIG_FILE_NAME};
pub use tcp_server::CoreServer;

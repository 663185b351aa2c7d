//! Domain layer: connection handles, per-domain config, the insertion
//! notification record and errors.

pub mod config;
pub mod connection;
pub mod errors;
pub mod notification;

pub use config::DomainConfig;
pub use connection::{ConnectionHandle, ConnectionId, Delivery};
pub use errors::RegistryError;
pub use notification::{decode_inserted_notification, InsertedNotification};

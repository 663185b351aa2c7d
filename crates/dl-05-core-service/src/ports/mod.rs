//! Ports layer.

pub mod outbound;

pub use outbound::{ConfigStore, NotificationBroadcaster};

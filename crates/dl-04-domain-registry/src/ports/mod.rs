//! Ports layer.

pub mod routing;

pub use routing::UserRouting;

//! Adapters layer: the live routing table and its null-object variant.

pub mod dummy;
pub mod routing_table;

pub use dummy::DummyRoutingTable;
pub use routing_table::{UserRoutingTable, DEFAULT_ANYCAST_TTL, MAX_PENDING_PER_USER};

//! # Domain Registry (dl-04)
//!
//! Hosts the node's domains and routes messages to the users connected to
//! each of them.
//!
//! ## Components
//!
//! | Type | Role |
//! |------|------|
//! | `DomainRegistry` | domain id -> storage handle, routing table, notification task |
//! | `UserRoutingTable` | user id -> live connections, pending queue, insert subscriptions |
//! | `DummyRoutingTable` | null object for domains this node does not host |
//! | `InsertedNotification` | compact record broadcast after an insert |
//!
//! ## Notification Flow
//!
//! ```text
//! admission ──publish──▶ shared-bus ──recv──▶ notifier task ──▶ UserRoutingTable::notify_inserted
//! ```
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): connection handles, config, notification record, errors
//! - **Ports Layer** (`ports/`): `UserRouting`
//! - **Adapters Layer** (`adapters/`): live and null-object routing tables

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod registry;

pub use adapters::{DummyRoutingTable, UserRoutingTable, DEFAULT_ANYCAST_TTL, MAX_PENDING_PER_USER};
pub use domain::{
    decode_inserted_notification, ConnectionHandle, ConnectionId, Delivery, DomainConfig,
    InsertedNotification, RegistryError,
};
pub use ports::UserRouting;
pub use registry::{Domain, DomainRegistry};

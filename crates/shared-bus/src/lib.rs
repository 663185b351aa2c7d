//! # Shared Bus - Domain Broadcast Bus
//!
//! Carries domain-scoped broadcasts between the components of one node.
//! Transaction admission publishes insertion notifications here; every
//! subscriber scoped to the same domain (the domain registry's fan-out task
//! in particular) receives them.
//!
//! ```text
//! ┌──────────────┐  publish()   ┌──────────────┐  recv()   ┌──────────────┐
//! │  Admission   │ ───────────▶ │  Event Bus   │ ────────▶ │ Domain fan-  │
//! │              │              │              │           │ out task     │
//! └──────────────┘              └──────────────┘           └──────────────┘
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{DomainEvent, EventFilter};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

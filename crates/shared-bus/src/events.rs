//! # Bus Events
//!
//! Everything on the bus is scoped to one domain.

use serde::{Deserialize, Serialize};
use shared_types::DomainId;

/// Event carried by the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainEvent {
    /// Compact insertion-notification record for a newly admitted transaction.
    TransactionInserted {
        domain_id: DomainId,
        payload: Vec<u8>,
    },
}

impl DomainEvent {
    /// Domain the event is scoped to.
    pub fn domain_id(&self) -> &DomainId {
        match self {
            DomainEvent::TransactionInserted { domain_id, .. } => domain_id,
        }
    }

    /// Short name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::TransactionInserted { .. } => "transaction_inserted",
        }
    }
}

/// Selects which events a subscription receives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// `None` receives events of every domain.
    pub domain: Option<DomainId>,
}

impl EventFilter {
    /// Receive everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Receive only events scoped to `domain`.
    pub fn domain(domain: DomainId) -> Self {
        Self {
            domain: Some(domain),
        }
    }

    pub fn matches(&self, event: &DomainEvent) -> bool {
        match &self.domain {
            Some(domain) => event.domain_id() == domain,
            None => true,
        }
    }
}

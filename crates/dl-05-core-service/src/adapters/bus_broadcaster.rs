//! # Bus Broadcaster
//!
//! Publishes insertion notifications on the in-process bus, where the
//! registry's per-domain notifier task picks them up.

use async_trait::async_trait;
use shared_bus::{DomainEvent, EventPublisher, InMemoryEventBus};
use shared_types::{DomainId, Identifier};
use std::sync::Arc;
use tracing::trace;

use crate::ports::NotificationBroadcaster;

pub struct BusBroadcaster {
    bus: Arc<InMemoryEventBus>,
}

impl BusBroadcaster {
    pub fn new(bus: Arc<InMemoryEventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl NotificationBroadcaster for BusBroadcaster {
    async fn broadcast_notification(&self, domain_id: &DomainId, payload: Vec<u8>) {
        let receivers = self
            .bus
            .publish(DomainEvent::TransactionInserted {
                domain_id: *domain_id,
                payload,
            })
            .await;
        trace!(domain = %domain_id.short(), receivers, "Insert notification broadcast");
    }
}

//! # Null-Object Routing
//!
//! Stands in for domains this node does not host. Every mutation and send
//! is absorbed.

use async_trait::async_trait;
use shared_types::{AssetGroupId, DomainId, Identifier, Message, UserId};
use tracing::trace;

use crate::domain::{ConnectionHandle, ConnectionId, InsertedNotification};
use crate::ports::UserRouting;

#[derive(Debug, Clone)]
pub struct DummyRoutingTable {
    domain_id: DomainId,
}

impl DummyRoutingTable {
    pub fn new(domain_id: DomainId) -> Self {
        Self { domain_id }
    }
}

#[async_trait]
impl UserRouting for DummyRoutingTable {
    fn domain_id(&self) -> &DomainId {
        &self.domain_id
    }

    fn register_user(&self, user_id: UserId, _conn: ConnectionHandle, _on_multinodes: bool) {
        trace!(domain = %self.domain_id.short(), user = %user_id.short(), "Ignoring registration");
    }

    fn unregister_user(&self, _user_id: &UserId, _conn: ConnectionId) {}

    async fn send_message_to_user(&self, _message: Message) -> bool {
        trace!(domain = %self.domain_id.short(), "Absorbing message for unknown domain");
        false
    }

    async fn get_stored_messages(&self, _user_id: &UserId, _query_id: Option<&[u8]>) -> usize {
        0
    }

    fn register_notification(&self, _asset_group_id: AssetGroupId, _user_id: UserId) {}

    fn unregister_notification(&self, _asset_group_id: &AssetGroupId, _user_id: &UserId) {}

    async fn notify_inserted(&self, _notification: &InsertedNotification) {}

    fn is_registered(&self, _user_id: &UserId) -> bool {
        false
    }

    fn users(&self) -> Vec<UserId> {
        Vec::new()
    }

    fn notification_list(&self) -> Vec<(AssetGroupId, Vec<UserId>)> {
        Vec::new()
    }

    fn close(&self) {}

    fn is_dummy(&self) -> bool {
        true
    }
}

//! # User Routing Port
//!
//! What the dispatcher needs from a domain's routing table. Unknown domains
//! are served by a null-object implementation so callers never branch on
//! the domain's existence just to route a reply.

use async_trait::async_trait;
use shared_types::{AssetGroupId, DomainId, Message, UserId};

use crate::domain::{ConnectionHandle, ConnectionId, InsertedNotification};

#[async_trait]
pub trait UserRouting: Send + Sync {
    fn domain_id(&self) -> &DomainId;

    /// Add `conn` to the user's live connections.
    fn register_user(&self, user_id: UserId, conn: ConnectionHandle, on_multinodes: bool);

    /// Remove `conn`. The entry disappears once no connection is left.
    fn unregister_user(&self, user_id: &UserId, conn: ConnectionId);

    /// Route by `destination_user_id`: deliver to live connections or queue.
    /// A live connection with a full outbound queue is waited on, never
    /// bypassed.
    ///
    /// ## Returns
    ///
    /// `true` when the message was delivered or queued.
    async fn send_message_to_user(&self, message: Message) -> bool;

    /// Flush the user's pending queue. `query_id` is stamped on each message
    /// when given. Returns the number of messages handed to connections.
    async fn get_stored_messages(&self, user_id: &UserId, query_id: Option<&[u8]>) -> usize;

    fn register_notification(&self, asset_group_id: AssetGroupId, user_id: UserId);

    fn unregister_notification(&self, asset_group_id: &AssetGroupId, user_id: &UserId);

    /// Fan an insertion notification out to subscribed users.
    async fn notify_inserted(&self, notification: &InsertedNotification);

    fn is_registered(&self, user_id: &UserId) -> bool;

    /// Registered users ordered by id.
    fn users(&self) -> Vec<UserId>;

    /// Subscriptions: `(group, users)` ordered by group id.
    fn notification_list(&self) -> Vec<(AssetGroupId, Vec<UserId>)>;

    /// Drop every entry, queue and subscription.
    fn close(&self);

    fn is_dummy(&self) -> bool {
        false
    }
}

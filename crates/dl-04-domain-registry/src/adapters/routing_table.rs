//! # User Routing Table
//!
//! Per-domain map from user id to live connections, with a bounded pending
//! queue for users that are not reachable and the insert-notification
//! subscription table.
//!
//! All state sits behind one `parking_lot::Mutex` that is never held across
//! an `.await`. Delivery first tries every live connection without blocking.
//! A connection whose outbound queue is full is then awaited after the lock
//! is released, so replies to one socket keep their order. Only users with
//! no live connection get their messages parked in the pending queue.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{AssetGroupId, Command, DomainId, Identifier, KeyType, Message, UserId};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::{debug, warn};

use crate::domain::{ConnectionHandle, ConnectionId, Delivery, InsertedNotification};
use crate::ports::UserRouting;

/// Pending messages kept per unreachable user. Oldest are dropped first.
pub const MAX_PENDING_PER_USER: usize = 256;

/// TTL stamped on anycast messages when they enter the node.
pub const DEFAULT_ANYCAST_TTL: i64 = 5;

#[derive(Debug, Default)]
struct UserEntry {
    connections: Vec<ConnectionHandle>,
    on_multinodes: bool,
}

#[derive(Debug, Default)]
struct RoutingState {
    users: BTreeMap<UserId, UserEntry>,
    pending: HashMap<UserId, VecDeque<Message>>,
    notifications: BTreeMap<AssetGroupId, Vec<UserId>>,
}

/// Result of the non-blocking pass over a user's connections.
#[derive(Debug, Default)]
struct Attempt {
    delivered: bool,
    /// Live connections whose outbound queue had no room.
    full: Vec<ConnectionHandle>,
}

impl RoutingState {
    /// Hand `message` to every live connection that has room. Closed
    /// connections are pruned on the way.
    fn try_deliver(&mut self, user_id: &UserId, message: &Message) -> Attempt {
        let anycast = message.flag(KeyType::IsAnycast);
        let mut attempt = Attempt::default();
        let Some(entry) = self.users.get_mut(user_id) else {
            return attempt;
        };

        entry.connections.retain(|conn| {
            if attempt.delivered && anycast {
                return true;
            }
            match conn.try_deliver(message.clone()) {
                Delivery::Sent => {
                    attempt.delivered = true;
                    true
                }
                Delivery::Full => {
                    attempt.full.push(conn.clone());
                    true
                }
                Delivery::Closed => {
                    debug!(conn = %conn.id(), user = %user_id.short(), "Pruning closed connection");
                    false
                }
            }
        });

        if entry.connections.is_empty() {
            self.remove_user(user_id);
        }
        if attempt.delivered && anycast {
            attempt.full.clear();
        }
        attempt
    }

    fn prune(&mut self, user_id: &UserId, conn: ConnectionId) {
        let Some(entry) = self.users.get_mut(user_id) else {
            return;
        };
        entry.connections.retain(|c| c.id() != conn);
        if entry.connections.is_empty() {
            self.remove_user(user_id);
        }
    }

    fn enqueue(&mut self, user_id: UserId, mut message: Message) -> bool {
        if message.flag(KeyType::IsAnycast) {
            let ttl = message.int(KeyType::AnycastTtl).unwrap_or(0) - 1;
            if ttl <= 0 {
                debug!(user = %user_id.short(), "Anycast TTL expired, discarding");
                return false;
            }
            message.set_int(KeyType::AnycastTtl, ttl);
        }

        let queue = self.pending.entry(user_id).or_default();
        if queue.len() >= MAX_PENDING_PER_USER {
            queue.pop_front();
            warn!(user = %user_id.short(), "Pending queue full, dropped oldest message");
        }
        queue.push_back(message);
        true
    }

    fn remove_user(&mut self, user_id: &UserId) {
        self.users.remove(user_id);
        self.notifications.retain(|_, users| {
            users.retain(|u| u != user_id);
            !users.is_empty()
        });
    }
}

/// Routing table of one hosted domain.
#[derive(Debug)]
pub struct UserRoutingTable {
    domain_id: DomainId,
    state: Mutex<RoutingState>,
}

impl UserRoutingTable {
    pub fn new(domain_id: DomainId) -> Self {
        Self {
            domain_id,
            state: Mutex::new(RoutingState::default()),
        }
    }

    /// Messages waiting for `user_id`.
    pub fn pending_count(&self, user_id: &UserId) -> usize {
        self.state.lock().pending.get(user_id).map_or(0, VecDeque::len)
    }

    pub fn connection_count(&self, user_id: &UserId) -> usize {
        self.state
            .lock()
            .users
            .get(user_id)
            .map_or(0, |e| e.connections.len())
    }

    pub fn is_on_multinodes(&self, user_id: &UserId) -> bool {
        self.state
            .lock()
            .users
            .get(user_id)
            .is_some_and(|e| e.on_multinodes)
    }

    /// Deliver to the user's live connections, waiting for room on those
    /// whose outbound queue is full. `false` when no connection took it.
    async fn deliver_live(&self, user_id: &UserId, message: &Message) -> bool {
        let attempt = self.state.lock().try_deliver(user_id, message);
        if attempt.full.is_empty() {
            return attempt.delivered;
        }

        let anycast = message.flag(KeyType::IsAnycast);
        let mut delivered = attempt.delivered;
        let mut closed = Vec::new();
        for conn in attempt.full {
            if delivered && anycast {
                break;
            }
            debug!(conn = %conn.id(), user = %user_id.short(), "Outbound queue full, waiting");
            if conn.deliver(message.clone()).await {
                delivered = true;
            } else {
                closed.push(conn.id());
            }
        }

        if !closed.is_empty() {
            let mut state = self.state.lock();
            for conn in closed {
                state.prune(user_id, conn);
            }
        }
        delivered
    }

    async fn route(&self, user_id: UserId, message: Message) -> bool {
        if self.deliver_live(&user_id, &message).await {
            return true;
        }
        self.state.lock().enqueue(user_id, message)
    }
}

#[async_trait]
impl UserRouting for UserRoutingTable {
    fn domain_id(&self) -> &DomainId {
        &self.domain_id
    }

    fn register_user(&self, user_id: UserId, conn: ConnectionHandle, on_multinodes: bool) {
        let mut state = self.state.lock();
        let entry = state.users.entry(user_id).or_default();
        if !entry.connections.contains(&conn) {
            entry.connections.push(conn);
        }
        entry.on_multinodes = on_multinodes;
        debug!(
            domain = %self.domain_id.short(),
            user = %user_id.short(),
            connections = entry.connections.len(),
            "User registered"
        );
    }

    fn unregister_user(&self, user_id: &UserId, conn: ConnectionId) {
        let mut state = self.state.lock();
        let Some(entry) = state.users.get_mut(user_id) else {
            return;
        };
        entry.connections.retain(|c| c.id() != conn);
        if entry.connections.is_empty() {
            state.remove_user(user_id);
            debug!(domain = %self.domain_id.short(), user = %user_id.short(), "User unregistered");
        }
    }

    async fn send_message_to_user(&self, message: Message) -> bool {
        let user_id = match message.id::<UserId>(KeyType::DestinationUserId) {
            Ok(Some(user_id)) => user_id,
            Ok(None) => {
                warn!(domain = %self.domain_id.short(), "Message without destination, dropping");
                return false;
            }
            Err(e) => {
                warn!(domain = %self.domain_id.short(), error = %e, "Bad destination, dropping");
                return false;
            }
        };
        self.route(user_id, message).await
    }

    async fn get_stored_messages(&self, user_id: &UserId, query_id: Option<&[u8]>) -> usize {
        let mut queue = {
            let mut state = self.state.lock();
            if !state.users.contains_key(user_id) {
                return 0;
            }
            match state.pending.remove(user_id) {
                Some(queue) => queue,
                None => return 0,
            }
        };

        let mut sent = 0;
        while let Some(mut message) = queue.pop_front() {
            if let Some(qid) = query_id {
                message.set_bytes(KeyType::QueryId, qid);
            }
            if self.deliver_live(user_id, &message).await {
                sent += 1;
            } else {
                queue.push_front(message);
                break;
            }
        }

        if !queue.is_empty() {
            // Anything queued meanwhile is newer than what is left.
            let mut state = self.state.lock();
            let pending = state.pending.entry(*user_id).or_default();
            while let Some(message) = queue.pop_back() {
                pending.push_front(message);
            }
            while pending.len() > MAX_PENDING_PER_USER {
                pending.pop_front();
            }
        }
        debug!(user = %user_id.short(), sent, "Flushed stored messages");
        sent
    }

    fn register_notification(&self, asset_group_id: AssetGroupId, user_id: UserId) {
        let mut state = self.state.lock();
        let users = state.notifications.entry(asset_group_id).or_default();
        if !users.contains(&user_id) {
            users.push(user_id);
        }
    }

    fn unregister_notification(&self, asset_group_id: &AssetGroupId, user_id: &UserId) {
        let mut state = self.state.lock();
        if let Some(users) = state.notifications.get_mut(asset_group_id) {
            users.retain(|u| u != user_id);
            if users.is_empty() {
                state.notifications.remove(asset_group_id);
            }
        }
    }

    async fn notify_inserted(&self, notification: &InsertedNotification) {
        let recipients: Vec<UserId> = {
            let state = self.state.lock();
            let mut recipients = Vec::new();
            for group in &notification.asset_group_ids {
                if let Some(users) = state.notifications.get(group) {
                    for user in users {
                        if !recipients.contains(user) {
                            recipients.push(*user);
                        }
                    }
                }
            }
            recipients
        };

        let groups: Vec<Vec<u8>> = notification
            .asset_group_ids
            .iter()
            .map(|g| g.to_vec())
            .collect();
        for user in recipients {
            let mut message = Message::with_command(Command::NotifyInserted);
            message
                .set_id(KeyType::DomainId, &notification.domain_id)
                .set_id(KeyType::DestinationUserId, &user)
                .set_id(KeyType::TransactionId, &notification.transaction_id)
                .set_list(KeyType::AssetGroupIds, groups.clone());
            self.route(user, message).await;
        }
    }

    fn is_registered(&self, user_id: &UserId) -> bool {
        self.state.lock().users.contains_key(user_id)
    }

    fn users(&self) -> Vec<UserId> {
        self.state.lock().users.keys().copied().collect()
    }

    fn notification_list(&self) -> Vec<(AssetGroupId, Vec<UserId>)> {
        self.state
            .lock()
            .notifications
            .iter()
            .map(|(group, users)| (*group, users.clone()))
            .collect()
    }

    fn close(&self) {
        *self.state.lock() = RoutingState::default();
        debug!(domain = %self.domain_id.short(), "Routing table closed");
    }
}

//! # Command Dispatcher
//!
//! One decoded message in, zero or more replies out.
//!
//! ## Reply Delivery
//!
//! | Reply | Path |
//! |-------|------|
//! | Results of search, count, traverse, insert | routing table of the domain |
//! | Errors | routing table when the domain is hosted, else the socket |
//! | `GET_*`, setup and close domain | always the socket |
//!
//! Unknown commands, and response or notification commands a client has no
//! business sending, are logged and dropped without a reply.

use dl_03_ledger_storage::SearchFilter;
use dl_04_domain_registry::{
    ConnectionHandle, DomainConfig, RegistryError, UserRouting, DEFAULT_ANYCAST_TTL,
};
use shared_types::{
    status, AssetGroupId, AssetId, Command, DomainId, IdError, Identifier, KeyType, Message,
    TransactionId, UserId,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::search::TxidSearch;
use super::traversal::TraversalQuery;
use super::CoreService;
use crate::domain::{base_reply, set_error, REASON_INVALID_PARAMS, REASON_MISSING_PARAMS};

const REASON_NOT_FOUND: &str = "Cannot find transaction";
const REASON_FORWARD_FAILED: &str = "Fail to forward transaction";
const REASON_ALREADY_EXISTS: &str = "Already exists";
const REASON_NO_SUCH_DOMAIN: &str = "No such domain";

/// What the connection loop does after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Per-connection state the dispatcher reads and updates.
#[derive(Debug)]
pub struct ConnectionContext {
    handle: ConnectionHandle,
    peer: SocketAddr,
    identities: Vec<(DomainId, UserId)>,
}

impl ConnectionContext {
    pub fn new(handle: ConnectionHandle, peer: SocketAddr) -> Self {
        Self {
            handle,
            peer,
            identities: Vec::new(),
        }
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// `(domain, user)` pairs registered through this connection.
    pub fn identities(&self) -> &[(DomainId, UserId)] {
        &self.identities
    }

    async fn send_direct(&self, message: Message) {
        if !self.handle.deliver(message).await {
            debug!(peer = %self.peer, "Connection closed before reply");
        }
    }

    fn remember(&mut self, domain_id: DomainId, user_id: UserId) {
        if !self.identities.contains(&(domain_id, user_id)) {
            self.identities.push((domain_id, user_id));
        }
    }

    fn forget(&mut self, domain_id: &DomainId, user_id: &UserId) {
        self.identities
            .retain(|(d, u)| !(d == domain_id && u == user_id));
    }
}

/// Why a request was rejected before it was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamError {
    Missing(KeyType),
    Invalid(KeyType),
}

impl ParamError {
    fn reason(self) -> &'static str {
        match self {
            ParamError::Missing(_) => REASON_MISSING_PARAMS,
            ParamError::Invalid(_) => REASON_INVALID_PARAMS,
        }
    }

    fn key(self) -> KeyType {
        match self {
            ParamError::Missing(key) | ParamError::Invalid(key) => key,
        }
    }
}

type Handled = Result<(), ParamError>;

fn require<T: Identifier>(request: &Message, key: KeyType) -> Result<T, ParamError> {
    optional(request, key)?.ok_or(ParamError::Missing(key))
}

fn optional<T: Identifier>(request: &Message, key: KeyType) -> Result<Option<T>, ParamError> {
    request
        .id::<T>(key)
        .map_err(|_: IdError| ParamError::Invalid(key))
}

fn require_bytes(request: &Message, key: KeyType) -> Result<&[u8], ParamError> {
    request.bytes(key).ok_or(ParamError::Missing(key))
}

fn require_int(request: &Message, key: KeyType) -> Result<i64, ParamError> {
    request.int(key).ok_or(ParamError::Missing(key))
}

fn require_present(request: &Message, keys: &[KeyType]) -> Handled {
    match request.first_missing(keys) {
        Some(key) => Err(ParamError::Missing(key)),
        None => Ok(()),
    }
}

/// Search conditions shared by search-with-conditions and count.
fn search_filter(request: &Message) -> Result<SearchFilter, ParamError> {
    let count = match request.int(KeyType::Count) {
        Some(count) => usize::try_from(count).map_err(|_| ParamError::Invalid(KeyType::Count))?,
        None => 1,
    };
    Ok(SearchFilter {
        asset_group_id: optional::<AssetGroupId>(request, KeyType::AssetGroupId)?,
        asset_id: optional::<AssetId>(request, KeyType::AssetId)?,
        user_id: optional::<UserId>(request, KeyType::UserId)?,
        direction: request.int(KeyType::Direction).unwrap_or(0),
        count,
    })
}

/// `u16 BE count | ids`.
fn encode_id_list<T: Identifier>(ids: &[T]) -> Vec<u8> {
    let ids = &ids[..ids.len().min(u16::MAX as usize)];
    let mut out = Vec::with_capacity(2 + ids.len() * shared_types::ID_LENGTH);
    out.extend_from_slice(&(ids.len() as u16).to_be_bytes());
    for id in ids {
        out.extend_from_slice(id.as_bytes());
    }
    out
}

/// `u16 BE group count`, then per group `group id | u16 BE user count | user ids`.
fn encode_notification_list(entries: &[(AssetGroupId, Vec<UserId>)]) -> Vec<u8> {
    let entries = &entries[..entries.len().min(u16::MAX as usize)];
    let mut out = Vec::new();
    out.extend_from_slice(&(entries.len() as u16).to_be_bytes());
    for (group, users) in entries {
        out.extend_from_slice(group.as_bytes());
        out.extend_from_slice(&encode_id_list(users));
    }
    out
}

impl CoreService {
    /// Handle one message from `conn`.
    pub async fn dispatch(&self, request: Message, conn: &mut ConnectionContext) -> Flow {
        self.stats
            .update_stats_increment("client", "num_message_receive", 1);

        let command = match request.command() {
            Some(command) if request.contains(KeyType::SourceUserId) => command,
            _ => {
                debug!(peer = %conn.peer, "Message has bad format");
                self.reject_malformed(&request, conn).await;
                return Flow::Continue;
            }
        };

        let handled = match command {
            Command::RequestSearchTransaction => self.handle_search_transaction(&request, conn).await,
            Command::RequestSearchWithConditions => self.handle_search_with_conditions(&request, conn).await,
            Command::RequestCountTransactions => self.handle_count_transactions(&request, conn).await,
            Command::RequestTraverseTransactions => self.handle_traverse_transactions(&request, conn).await,
            Command::RequestGatherSignature => self.handle_gather_signature(&request, conn).await,
            Command::RequestInsert => self.handle_insert(&request, conn).await,
            Command::ResponseSignature => self.handle_signature_response(&request).await,
            Command::Message => self.handle_message(request.clone()).await,
            Command::Register => self.handle_register(&request, conn),
            Command::Unregister => {
                self.handle_unregister(&request, conn);
                return Flow::Close;
            }
            Command::RequestInsertNotification => self.handle_notification(&request, true),
            Command::CancelInsertNotification => self.handle_notification(&request, false),
            Command::RequestGetStats => self.handle_get_stats(&request, conn).await,
            Command::RequestGetConfig => self.handle_get_config(&request, conn).await,
            Command::RequestGetDomainList => self.handle_get_domain_list(&request, conn).await,
            Command::RequestGetUsers => self.handle_get_users(&request, conn).await,
            Command::RequestGetNodeId => self.handle_get_node_id(&request, conn).await,
            Command::RequestGetNotificationList => {
                self.handle_get_notification_list(&request, conn).await
            }
            Command::RequestSetupDomain => self.handle_setup_domain(&request, conn).await,
            Command::RequestCloseDomain => self.handle_close_domain(&request, conn).await,
            Command::RequestGetStoredMessages => self.handle_get_stored_messages(&request).await,
            other => {
                error!(peer = %conn.peer, command = %other, "Bad command/response");
                Ok(())
            }
        };

        if let Err(e) = handled {
            debug!(%command, key = %e.key(), reason = e.reason(), "Rejecting request");
            let reply = base_reply(&request, command.reply_command());
            self.send_error(reply, status::EINVALID_COMMAND, e.reason(), conn)
                .await;
        }
        Flow::Continue
    }

    /// Unregister every identity bound through `conn`.
    pub fn release_connection(&self, conn: &mut ConnectionContext) {
        let conn_id = conn.handle.id();
        for (domain_id, user_id) in conn.identities.drain(..) {
            self.registry
                .routing_for(&domain_id)
                .unregister_user(&user_id, conn_id);
        }
    }

    /// Answer a message that lacks `command` or `source_user_id`. Without a
    /// source the socket is the only way back.
    async fn reject_malformed(&self, request: &Message, conn: &ConnectionContext) {
        let mut reply = Message::new();
        if let Some(command) = request.command() {
            reply.set_command(command.reply_command());
        }
        for key in [KeyType::DomainId, KeyType::QueryId] {
            if let Some(value) = request.get(key) {
                reply.insert(key, value.clone());
            }
        }
        set_error(&mut reply, status::EINVALID_COMMAND, REASON_MISSING_PARAMS);
        match request.get(KeyType::SourceUserId) {
            Some(source) => {
                reply.insert(KeyType::DestinationUserId, source.clone());
                self.route_or_direct(reply, conn).await;
            }
            None => conn.send_direct(reply).await,
        }
    }

    /// Route `reply` when its domain is hosted, otherwise write it to the socket.
    async fn route_or_direct(&self, reply: Message, conn: &ConnectionContext) {
        let hosted = match reply.id::<DomainId>(KeyType::DomainId) {
            Ok(Some(domain_id)) => self.registry.get(&domain_id),
            _ => None,
        };
        match hosted {
            Some(domain) => {
                domain.routing().send_message_to_user(reply).await;
            }
            None => conn.send_direct(reply).await,
        }
    }

    async fn send_error(&self, mut reply: Message, code: i64, reason: &str, conn: &ConnectionContext) {
        set_error(&mut reply, code, reason);
        self.route_or_direct(reply, conn).await;
    }

    async fn route(&self, domain_id: &DomainId, reply: Message) {
        self.routing(domain_id).send_message_to_user(reply).await;
    }

    fn routing(&self, domain_id: &DomainId) -> Arc<dyn UserRouting> {
        self.registry.routing_for(domain_id)
    }

    async fn handle_search_transaction(&self, request: &Message, conn: &ConnectionContext) -> Handled {
        let domain_id: DomainId = require(request, KeyType::DomainId)?;
        let transaction_id: TransactionId = require(request, KeyType::TransactionId)?;

        let mut reply = base_reply(request, Command::ResponseSearchTransaction);
        match self.search_transaction_by_txid(&domain_id, &transaction_id) {
            None => {
                self.send_error(reply, status::ENOTRANSACTION, REASON_NOT_FOUND, conn)
                    .await
            }
            Some(TxidSearch::Valid(data)) => {
                reply.set_bytes(KeyType::TransactionData, data);
                self.route(&domain_id, reply).await;
            }
            Some(TxidSearch::Compromised(data)) => {
                reply
                    .set_bytes(KeyType::CompromisedTransactionData, data)
                    .set_int(KeyType::Status, status::EBADTRANSACTION);
                self.route(&domain_id, reply).await;
            }
        }
        Ok(())
    }

    async fn handle_search_with_conditions(&self, request: &Message, conn: &ConnectionContext) -> Handled {
        let domain_id: DomainId = require(request, KeyType::DomainId)?;
        let filter = search_filter(request)?;

        let mut reply = base_reply(request, Command::ResponseSearchWithConditions);
        match self.search_transaction_with_condition(&domain_id, &filter) {
            Some(result) if !result.transactions.is_empty() => {
                reply.set_list(KeyType::Transactions, result.transactions);
                if !result.compromised_transactions.is_empty() {
                    reply.set_list(KeyType::CompromisedTransactions, result.compromised_transactions);
                }
                self.route(&domain_id, reply).await;
            }
            _ => {
                self.send_error(reply, status::ENOTRANSACTION, REASON_NOT_FOUND, conn)
                    .await
            }
        }
        Ok(())
    }

    async fn handle_count_transactions(&self, request: &Message, conn: &ConnectionContext) -> Handled {
        let domain_id: DomainId = require(request, KeyType::DomainId)?;
        let filter = search_filter(request)?;

        let mut reply = base_reply(request, Command::ResponseCountTransactions);
        match self.count_transactions(&domain_id, &filter) {
            Some(count) => {
                reply.set_int(KeyType::Count, i64::try_from(count).unwrap_or(i64::MAX));
                self.route(&domain_id, reply).await;
            }
            None => {
                self.send_error(reply, status::EINVALID_COMMAND, REASON_NO_SUCH_DOMAIN, conn)
                    .await
            }
        }
        Ok(())
    }

    async fn handle_traverse_transactions(&self, request: &Message, conn: &ConnectionContext) -> Handled {
        let domain_id: DomainId = require(request, KeyType::DomainId)?;
        let start: TransactionId = require(request, KeyType::TransactionId)?;
        let direction = require_int(request, KeyType::Direction)?;
        let hop_count = require_int(request, KeyType::HopCount)?;
        let query = TraversalQuery {
            start,
            asset_group_id: optional(request, KeyType::AssetGroupId)?,
            user_id: optional(request, KeyType::UserId)?,
            direction,
            hop_count,
        };

        let mut reply = base_reply(request, Command::ResponseTraverseTransactions);
        reply.set_id(KeyType::TransactionId, &start);
        match self.traverse_transactions(&domain_id, &query) {
            Some(result) if !result.tree.is_empty() => {
                reply
                    .set_tree(KeyType::TransactionTree, result.tree)
                    .set_bool(KeyType::AllIncluded, result.all_included);
                self.route(&domain_id, reply).await;
            }
            _ => {
                self.send_error(reply, status::ENOTRANSACTION, REASON_NOT_FOUND, conn)
                    .await
            }
        }
        Ok(())
    }

    async fn handle_gather_signature(&self, request: &Message, conn: &ConnectionContext) -> Handled {
        let _: DomainId = require(request, KeyType::DomainId)?;
        require_present(request, &[KeyType::TransactionData])?;

        if !self.distribute_transaction_to_gather_signatures(request).await {
            let reply = base_reply(request, Command::ResponseGatherSignature);
            self.send_error(reply, status::EINVALID_COMMAND, REASON_FORWARD_FAILED, conn)
                .await;
        }
        Ok(())
    }

    async fn handle_insert(&self, request: &Message, conn: &ConnectionContext) -> Handled {
        let domain_id: DomainId = require(request, KeyType::DomainId)?;
        let raw = require_bytes(request, KeyType::TransactionData)?;

        let mut reply = base_reply(request, Command::ResponseInsert);
        match self.insert_transaction(&domain_id, raw).await {
            Ok(transaction_id) => {
                reply.set_id(KeyType::TransactionId, &transaction_id);
                self.route(&domain_id, reply).await;
            }
            Err(e) => {
                self.send_error(reply, status::EINVALID_COMMAND, &e.to_string(), conn)
                    .await
            }
        }
        Ok(())
    }

    async fn handle_signature_response(&self, request: &Message) -> Handled {
        let _: DomainId = require(request, KeyType::DomainId)?;
        require_present(request, &[KeyType::DestinationUserId, KeyType::SourceUserId])?;
        self.relay_signature_response(request).await;
        Ok(())
    }

    async fn handle_message(&self, mut request: Message) -> Handled {
        let domain_id: DomainId = require(&request, KeyType::DomainId)?;
        require_present(&request, &[KeyType::DestinationUserId])?;
        if request.contains(KeyType::IsAnycast) {
            request.set_int(KeyType::AnycastTtl, DEFAULT_ANYCAST_TTL);
        }
        self.route(&domain_id, request).await;
        Ok(())
    }

    fn handle_register(&self, request: &Message, conn: &mut ConnectionContext) -> Handled {
        let Some(domain_id) = optional::<DomainId>(request, KeyType::DomainId)? else {
            return Ok(());
        };
        let user_id: UserId = require(request, KeyType::SourceUserId)?;
        debug!(
            domain = %domain_id.short(),
            user = %user_id.short(),
            "register_user"
        );
        self.routing(&domain_id).register_user(
            user_id,
            conn.handle.clone(),
            request.flag(KeyType::OnMultinodes),
        );
        conn.remember(domain_id, user_id);
        Ok(())
    }

    fn handle_unregister(&self, request: &Message, conn: &mut ConnectionContext) {
        let domain_id = optional::<DomainId>(request, KeyType::DomainId).ok().flatten();
        let user_id = optional::<UserId>(request, KeyType::SourceUserId).ok().flatten();
        if let (Some(domain_id), Some(user_id)) = (domain_id, user_id) {
            self.routing(&domain_id)
                .unregister_user(&user_id, conn.handle.id());
            conn.forget(&domain_id, &user_id);
        }
    }

    fn handle_notification(&self, request: &Message, subscribe: bool) -> Handled {
        let domain_id: DomainId = require(request, KeyType::DomainId)?;
        let asset_group_id: AssetGroupId = require(request, KeyType::AssetGroupId)?;
        let user_id: UserId = require(request, KeyType::SourceUserId)?;
        let routing = self.routing(&domain_id);
        if subscribe {
            routing.register_notification(asset_group_id, user_id);
        } else {
            routing.unregister_notification(&asset_group_id, &user_id);
        }
        Ok(())
    }

    async fn handle_get_stats(&self, request: &Message, conn: &ConnectionContext) -> Handled {
        let mut reply = base_reply(request, Command::ResponseGetStats);
        reply.set_text(KeyType::Stats, self.stats.to_json());
        conn.send_direct(reply).await;
        Ok(())
    }

    async fn handle_get_config(&self, request: &Message, conn: &ConnectionContext) -> Handled {
        let mut reply = base_reply(request, Command::ResponseGetConfig);
        match self.config.get_json_config() {
            Ok(json) => {
                reply.set_text(KeyType::BbcConfiguration, json);
            }
            Err(e) => {
                warn!(error = %e, "Failed to render configuration");
                set_error(&mut reply, status::EOTHER, &e.to_string());
            }
        }
        conn.send_direct(reply).await;
        Ok(())
    }

    async fn handle_get_domain_list(&self, request: &Message, conn: &ConnectionContext) -> Handled {
        let mut reply = base_reply(request, Command::ResponseGetDomainList);
        reply.set_bytes(KeyType::DomainList, encode_id_list(&self.registry.domain_ids()));
        conn.send_direct(reply).await;
        Ok(())
    }

    async fn handle_get_users(&self, request: &Message, conn: &ConnectionContext) -> Handled {
        let users = match optional::<DomainId>(request, KeyType::DomainId)? {
            Some(domain_id) => self.routing(&domain_id).users(),
            None => Vec::new(),
        };
        let mut reply = base_reply(request, Command::ResponseGetUsers);
        reply.set_bytes(KeyType::UserList, encode_id_list(&users));
        conn.send_direct(reply).await;
        Ok(())
    }

    async fn handle_get_node_id(&self, request: &Message, conn: &ConnectionContext) -> Handled {
        let domain = optional::<DomainId>(request, KeyType::DomainId)?
            .and_then(|domain_id| self.registry.get(&domain_id));

        let mut reply = base_reply(request, Command::ResponseGetNodeId);
        match domain {
            Some(domain) => {
                reply
                    .set_id(KeyType::NodeId, domain.node_id())
                    .set_bool(KeyType::Result, true);
            }
            None => {
                reply.set_bool(KeyType::Result, false);
            }
        }
        conn.send_direct(reply).await;
        Ok(())
    }

    async fn handle_get_notification_list(&self, request: &Message, conn: &ConnectionContext) -> Handled {
        let routing = optional::<DomainId>(request, KeyType::DomainId)?
            .map(|domain_id| self.routing(&domain_id))
            .filter(|routing| !routing.is_dummy());

        let mut reply = base_reply(request, Command::ResponseGetNotificationList);
        match routing {
            Some(routing) => {
                reply
                    .set_bytes(
                        KeyType::NotificationList,
                        encode_notification_list(&routing.notification_list()),
                    )
                    .set_bool(KeyType::Result, true);
            }
            None => {
                reply.set_bool(KeyType::Result, false);
            }
        }
        conn.send_direct(reply).await;
        Ok(())
    }

    async fn handle_setup_domain(&self, request: &Message, conn: &ConnectionContext) -> Handled {
        let domain_id: DomainId = require(request, KeyType::DomainId)?;
        let config = match request.text(KeyType::BbcConfiguration) {
            Some(json) => serde_json::from_str::<DomainConfig>(json)
                .map_err(|_| ParamError::Invalid(KeyType::BbcConfiguration))?,
            None => DomainConfig::default(),
        };

        let mut reply = base_reply(request, Command::ResponseSetupDomain);
        match self.registry.create_domain(domain_id, config.clone()) {
            Ok(domain) => {
                self.remember_domain(&domain_id, config, domain.node_id());
                info!(domain = %domain_id.short(), "Domain set up");
                reply.set_bool(KeyType::Result, true);
            }
            Err(RegistryError::AlreadyExists(_)) => {
                reply
                    .set_bool(KeyType::Result, false)
                    .set_text(KeyType::Reason, REASON_ALREADY_EXISTS);
            }
            Err(e) => {
                warn!(domain = %domain_id.short(), error = %e, "Domain setup failed");
                reply
                    .set_bool(KeyType::Result, false)
                    .set_text(KeyType::Reason, e.to_string());
            }
        }
        reply.set_id(KeyType::DomainId, &domain_id);
        conn.send_direct(reply).await;
        Ok(())
    }

    async fn handle_close_domain(&self, request: &Message, conn: &ConnectionContext) -> Handled {
        let domain_id: DomainId = require(request, KeyType::DomainId)?;

        let mut reply = base_reply(request, Command::ResponseCloseDomain);
        reply.remove(KeyType::DomainId);
        match self.registry.remove_domain(&domain_id) {
            Ok(()) => {
                self.config.remove_domain(&domain_id);
                reply.set_bool(KeyType::Result, true);
            }
            Err(_) => {
                reply
                    .set_bool(KeyType::Result, false)
                    .set_text(KeyType::Reason, REASON_NO_SUCH_DOMAIN);
            }
        }
        conn.send_direct(reply).await;
        Ok(())
    }

    async fn handle_get_stored_messages(&self, request: &Message) -> Handled {
        let domain_id: DomainId = require(request, KeyType::DomainId)?;
        let user_id: UserId = require(request, KeyType::SourceUserId)?;
        let query_id = if request.contains(KeyType::RequestAsync) {
            None
        } else {
            request.bytes(KeyType::QueryId)
        };
        let flushed = self
            .routing(&domain_id)
            .get_stored_messages(&user_id, query_id)
            .await;
        debug!(user = %user_id.short(), flushed, "get_stored_messages");
        Ok(())
    }
}

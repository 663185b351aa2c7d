//! # Reply Construction
//!
//! Every reply starts from the same base: the request's domain, the
//! response command, the requester as destination, the echoed query id and
//! `status = ESUCCESS`.

use shared_types::{status, Command, KeyType, Message};

/// Reason attached when a mandatory field is absent.
pub const REASON_MISSING_PARAMS: &str = "lack of mandatory params";
/// Reason attached when a field is present but unusable.
pub const REASON_INVALID_PARAMS: &str = "invalid params";

pub fn base_reply(request: &Message, command: Command) -> Message {
    let mut reply = Message::with_command(command);
    if let Some(domain_id) = request.bytes(KeyType::DomainId) {
        reply.set_bytes(KeyType::DomainId, domain_id);
    }
    if let Some(source) = request.bytes(KeyType::SourceUserId) {
        reply.set_bytes(KeyType::DestinationUserId, source);
    }
    if let Some(query_id) = request.bytes(KeyType::QueryId) {
        reply.set_bytes(KeyType::QueryId, query_id);
    }
    reply.set_int(KeyType::Status, status::ESUCCESS);
    reply
}

/// Mark `reply` as failed.
pub fn set_error(reply: &mut Message, code: i64, reason: &str) {
    reply
        .set_int(KeyType::Status, code)
        .set_text(KeyType::Reason, reason);
}

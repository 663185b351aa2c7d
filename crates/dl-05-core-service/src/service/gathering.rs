//! # Signature Gathering
//!
//! A requester asks the node to collect signatures: the node fans a
//! `REQUEST_SIGNATURE` out to every listed user, and relays each
//! `RESPONSE_SIGNATURE` back to the requester as `RESPONSE_GATHER_SIGNATURE`.

use shared_types::{status, Command, DomainId, Identifier, KeyType, Message, UserId};
use tracing::{debug, warn};

use super::CoreService;
use crate::domain::base_reply;

/// Keys copied verbatim from a gather request into each signature request.
const FORWARDED_CONTEXT: [KeyType; 3] = [
    KeyType::Hint,
    KeyType::TransactionData,
    KeyType::Transactions,
];

const REASON_NO_STATUS: &str = "Unknown error in signature response";

impl CoreService {
    /// Fan a gather request out to its destinations, skipping the requester.
    ///
    /// `false` when the domain is not hosted or no destination list was
    /// given. Individual delivery outcomes are the routing table's concern.
    pub async fn distribute_transaction_to_gather_signatures(&self, request: &Message) -> bool {
        let Ok(Some(domain_id)) = request.id::<DomainId>(KeyType::DomainId) else {
            return false;
        };
        let Some(domain) = self.registry.get(&domain_id) else {
            warn!(domain = %domain_id.short(), "Gather request for unknown domain");
            return false;
        };
        let Some(destinations) = request.list(KeyType::DestinationUserIds) else {
            return false;
        };
        let source = request.bytes(KeyType::SourceUserId);
        let routing = domain.routing();

        for destination in destinations {
            if source == Some(destination.as_slice()) {
                continue;
            }
            let mut out = Message::with_command(Command::RequestSignature);
            out.set_id(KeyType::DomainId, &domain_id)
                .set_bytes(KeyType::DestinationUserId, destination.clone())
                .set_int(KeyType::Status, status::ESUCCESS);
            for key in [KeyType::SourceUserId, KeyType::QueryId]
                .into_iter()
                .chain(FORWARDED_CONTEXT)
            {
                if let Some(value) = request.get(key) {
                    out.insert(key, value.clone());
                }
            }
            if !routing.send_message_to_user(out).await {
                let user = UserId::from_slice(destination).map(|u| u.short()).unwrap_or_default();
                debug!(user = %user, "Signature request queued");
            }
        }
        true
    }

    /// Relay a signer's answer to the user who asked for it.
    pub async fn relay_signature_response(&self, response: &Message) {
        let mut relayed = base_reply(response, Command::ResponseGatherSignature);
        if let Some(requester) = response.bytes(KeyType::DestinationUserId) {
            relayed.set_bytes(KeyType::DestinationUserId, requester);
        }

        if let Some(signature) = response.bytes(KeyType::Signature) {
            relayed.set_bytes(KeyType::Signature, signature);
            for key in [KeyType::TransactionDataFormat, KeyType::RefIndex] {
                if let Some(value) = response.get(key) {
                    relayed.insert(key, value.clone());
                }
            }
        } else {
            match response.int(KeyType::Status) {
                None => {
                    relayed
                        .set_int(KeyType::Status, status::EOTHER)
                        .set_text(KeyType::Reason, REASON_NO_STATUS);
                }
                Some(code) if code < status::ESUCCESS => {
                    relayed.set_int(KeyType::Status, code);
                    if let Some(reason) = response.text(KeyType::Reason) {
                        relayed.set_text(KeyType::Reason, reason);
                    }
                }
                Some(_) => {}
            }
        }
        if let Some(signer) = response.bytes(KeyType::SourceUserId) {
            relayed.set_bytes(KeyType::SourceUserId, signer);
        }

        let domain_id = match response.id::<DomainId>(KeyType::DomainId) {
            Ok(Some(id)) => id,
            _ => {
                debug!("Signature response without a usable domain");
                return;
            }
        };
        if !self
            .registry
            .routing_for(&domain_id)
            .send_message_to_user(relayed)
            .await
        {
            let requester = response.id::<UserId>(KeyType::DestinationUserId).ok().flatten();
            debug!(
                user = %requester.map(|u| u.short()).unwrap_or_default(),
                "Signature response not delivered"
            );
        }
    }
}

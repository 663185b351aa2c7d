//! # Transaction Builder
//!
//! Used by clients and tests to assemble a body, fix its id and collect
//! witness signatures.

use shared_crypto::Ed25519KeyPair;
use shared_types::{AssetGroupId, Identifier, TransactionId, UserId};
use std::time::{SystemTime, UNIX_EPOCH};

use super::entities::{
    Asset, Event, Pointer, Reference, Relation, SignatureEntry, Transaction, TransactionBody,
};
use super::errors::TransactionError;

/// Current body version.
pub const TRANSACTION_VERSION: u32 = 1;

/// Fluent builder for [`Transaction`].
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    body: TransactionBody,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionBuilder {
    pub fn new() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();
        Self {
            body: TransactionBody {
                version: TRANSACTION_VERSION,
                timestamp,
                ..TransactionBody::default()
            },
        }
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.body.timestamp = timestamp;
        self
    }

    pub fn event(self, asset_group_id: AssetGroupId, asset: Asset) -> Self {
        self.event_with_approvers(asset_group_id, asset, Vec::new())
    }

    pub fn event_with_approvers(
        mut self,
        asset_group_id: AssetGroupId,
        asset: Asset,
        mandatory_approvers: Vec<UserId>,
    ) -> Self {
        self.body.events.push(Event {
            asset_group_id,
            asset,
            mandatory_approvers,
        });
        self
    }

    pub fn relation(
        mut self,
        asset_group_id: AssetGroupId,
        asset: Option<Asset>,
        pointers: Vec<Pointer>,
    ) -> Self {
        self.body.relations.push(Relation {
            asset_group_id,
            asset,
            pointers,
        });
        self
    }

    pub fn reference(
        mut self,
        asset_group_id: AssetGroupId,
        transaction_id: TransactionId,
        event_index: u16,
    ) -> Self {
        self.body.references.push(Reference {
            asset_group_id,
            transaction_id,
            event_index,
        });
        self
    }

    pub fn witness(mut self, user_id: UserId) -> Self {
        if !self.body.witness.contains(&user_id) {
            self.body.witness.push(user_id);
        }
        self
    }

    /// Fix the body and stamp the computed id. Signatures are added
    /// afterwards with [`Transaction::sign`].
    pub fn build(self) -> Result<Transaction, TransactionError> {
        let mut tx = Transaction {
            transaction_id: TransactionId::default(),
            body: self.body,
            signatures: Vec::new(),
        };
        tx.transaction_id = tx.digest()?;
        Ok(tx)
    }
}

impl Transaction {
    /// Add (or replace) `user_id`'s signature over the transaction id.
    pub fn sign(&mut self, user_id: UserId, keypair: &Ed25519KeyPair) {
        let signature = keypair.sign(self.transaction_id.as_bytes());
        let entry = SignatureEntry {
            user_id,
            public_key: keypair.public_key().as_bytes().to_vec(),
            signature: signature.as_bytes().to_vec(),
        };
        match self.signatures.iter_mut().find(|s| s.user_id == user_id) {
            Some(existing) => *existing = entry,
            None => self.signatures.push(entry),
        }
    }

    /// Attach a signature produced elsewhere (e.g. relayed by a gathering
    /// round).
    pub fn add_signature(&mut self, entry: SignatureEntry) {
        self.signatures.retain(|s| s.user_id != entry.user_id);
        self.signatures.push(entry);
    }
}

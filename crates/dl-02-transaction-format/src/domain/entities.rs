//! # Transaction Entities
//!
//! ## Clusters
//!
//! - **Content**: `TransactionBody`, `Event`, `Relation`, `Reference`, `Asset`
//! - **Authorisation**: `SignatureEntry`
//! - **Envelope**: `Transaction` (declared id + body + signatures)

use bincode::Options;
use serde::{Deserialize, Serialize};
use shared_crypto::sha256_many;
use shared_types::{AssetGroupId, AssetId, Identifier, TransactionId, UserId};

use super::errors::TransactionError;

/// Largest serialized transaction accepted by [`Transaction::deserialize`].
pub const MAX_TRANSACTION_SIZE: u64 = 16 * 1024 * 1024;

fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_TRANSACTION_SIZE)
        .reject_trailing_bytes()
}

/// A unit of value owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// `SHA-256(user_id | nonce | body)`.
    pub asset_id: AssetId,
    pub user_id: UserId,
    pub nonce: Vec<u8>,
    pub body: Vec<u8>,
}

impl Asset {
    pub fn new(user_id: UserId, nonce: Vec<u8>, body: Vec<u8>) -> Self {
        let asset_id = Self::compute_id(&user_id, &nonce, &body);
        Self {
            asset_id,
            user_id,
            nonce,
            body,
        }
    }

    pub fn compute_id(user_id: &UserId, nonce: &[u8], body: &[u8]) -> AssetId {
        AssetId::new(sha256_many(&[&user_id.as_bytes()[..], nonce, body]))
    }

    /// Whether `asset_id` matches the content.
    pub fn is_consistent(&self) -> bool {
        self.asset_id == Self::compute_id(&self.user_id, &self.nonce, &self.body)
    }
}

/// Creates or transfers an asset inside an asset group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub asset_group_id: AssetGroupId,
    pub asset: Asset,
    /// Users that must sign any transaction consuming this event.
    pub mandatory_approvers: Vec<UserId>,
}

/// Pointer to a prior transaction (and optionally one of its assets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pointer {
    pub transaction_id: TransactionId,
    pub asset_id: Option<AssetId>,
}

/// Links this transaction to earlier ones without consuming their events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub asset_group_id: AssetGroupId,
    pub asset: Option<Asset>,
    pub pointers: Vec<Pointer>,
}

/// Consumes event `event_index` of a prior transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub asset_group_id: AssetGroupId,
    pub transaction_id: TransactionId,
    pub event_index: u16,
}

/// Signed content of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBody {
    pub version: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub events: Vec<Event>,
    pub relations: Vec<Relation>,
    pub references: Vec<Reference>,
    /// Users whose signatures are required.
    pub witness: Vec<UserId>,
}

/// One witness signature over the transaction id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub user_id: UserId,
    /// Ed25519 public key, 32 bytes.
    pub public_key: Vec<u8>,
    /// Ed25519 signature, 64 bytes.
    pub signature: Vec<u8>,
}

/// `(asset_group_id, asset_id, user_id)` row used for indexing and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetRecord {
    pub asset_group_id: AssetGroupId,
    pub asset_id: AssetId,
    pub user_id: UserId,
}

/// Serialized transaction envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Id declared by the author. Compare with [`Transaction::digest`].
    pub transaction_id: TransactionId,
    pub body: TransactionBody,
    pub signatures: Vec<SignatureEntry>,
}

impl Transaction {
    /// Parse a serialized transaction.
    pub fn deserialize(raw: &[u8]) -> Result<Self, TransactionError> {
        bincode_options()
            .deserialize(raw)
            .map_err(|e| TransactionError::Malformed(e.to_string()))
    }

    pub fn serialize(&self) -> Result<Vec<u8>, TransactionError> {
        bincode_options()
            .serialize(self)
            .map_err(|e| TransactionError::Serialization(e.to_string()))
    }

    /// Recompute the content digest.
    pub fn digest(&self) -> Result<TransactionId, TransactionError> {
        let body = bincode_options()
            .serialize(&self.body)
            .map_err(|e| TransactionError::Serialization(e.to_string()))?;
        Ok(TransactionId::new(shared_crypto::sha256(&body)))
    }

    /// Whether the declared id equals the recomputed digest.
    pub fn is_consistent(&self) -> bool {
        matches!(self.digest(), Ok(id) if id == self.transaction_id)
    }

    /// Every asset carried by events and relations, with its group.
    pub fn asset_records(&self) -> Vec<AssetRecord> {
        let events = self.body.events.iter().map(|e| AssetRecord {
            asset_group_id: e.asset_group_id,
            asset_id: e.asset.asset_id,
            user_id: e.asset.user_id,
        });
        let relations = self.body.relations.iter().filter_map(|r| {
            r.asset.as_ref().map(|asset| AssetRecord {
                asset_group_id: r.asset_group_id,
                asset_id: asset.asset_id,
                user_id: asset.user_id,
            })
        });
        events.chain(relations).collect()
    }

    /// Prior transactions this one points at (references, then relation
    /// pointers), de-duplicated in first-seen order.
    pub fn topology_edges(&self) -> Vec<TransactionId> {
        let mut edges: Vec<TransactionId> = Vec::new();
        let referenced = self.body.references.iter().map(|r| r.transaction_id);
        let pointed = self
            .body
            .relations
            .iter()
            .flat_map(|r| r.pointers.iter().map(|p| p.transaction_id));
        for id in referenced.chain(pointed) {
            if id != self.transaction_id && !edges.contains(&id) {
                edges.push(id);
            }
        }
        edges
    }

    /// Whether any asset row matches every given filter.
    pub fn matches_filter(
        &self,
        asset_group_id: Option<&AssetGroupId>,
        user_id: Option<&UserId>,
    ) -> bool {
        self.asset_records().iter().any(|rec| {
            asset_group_id.map_or(true, |g| &rec.asset_group_id == g)
                && user_id.map_or(true, |u| &rec.user_id == u)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(n: u8) -> UserId {
        UserId::new([n; 32])
    }

    fn group(n: u8) -> AssetGroupId {
        AssetGroupId::new([n; 32])
    }

    #[test]
    fn test_asset_id_is_content_digest() {
        let asset = Asset::new(user(1), b"nonce".to_vec(), b"body".to_vec());
        assert!(asset.is_consistent());
        let mut tampered = asset.clone();
        tampered.body = b"other".to_vec();
        assert!(!tampered.is_consistent());
    }

    #[test]
    fn test_serialize_is_canonical() {
        let tx = crate::TransactionBuilder::new()
            .event(group(1), Asset::new(user(1), vec![1], b"a".to_vec()))
            .build()
            .unwrap();
        let raw = tx.serialize().unwrap();
        let back = Transaction::deserialize(&raw).unwrap();
        assert_eq!(back.serialize().unwrap(), raw);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let tx = crate::TransactionBuilder::new().build().unwrap();
        let mut raw = tx.serialize().unwrap();
        raw.push(0);
        assert!(matches!(
            Transaction::deserialize(&raw),
            Err(TransactionError::Malformed(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(Transaction::deserialize(b"not a transaction").is_err());
        assert!(Transaction::deserialize(&[]).is_err());
    }

    #[test]
    fn test_topology_edges_deduplicated() {
        let prior = TransactionId::new([9; 32]);
        let tx = crate::TransactionBuilder::new()
            .reference(group(1), prior, 0)
            .relation(group(1), None, vec![Pointer {
                transaction_id: prior,
                asset_id: None,
            }])
            .build()
            .unwrap();
        assert_eq!(tx.topology_edges(), vec![prior]);
    }

    #[test]
    fn test_filter_requires_all_fields_on_one_row() {
        let tx = crate::TransactionBuilder::new()
            .event(group(1), Asset::new(user(1), vec![], vec![]))
            .event(group(2), Asset::new(user(2), vec![], vec![]))
            .build()
            .unwrap();
        assert!(tx.matches_filter(Some(&group(1)), Some(&user(1))));
        assert!(!tx.matches_filter(Some(&group(1)), Some(&user(2))));
        assert!(tx.matches_filter(None, None));
    }
}

//! # Validation
//!
//! Recomputes the digest and checks witness signatures.

use shared_crypto::{Ed25519PublicKey, Ed25519Signature};
use shared_types::{AssetId, Identifier, UserId};
use std::collections::HashSet;

use super::entities::{Asset, SignatureEntry, Transaction};

/// Outcome of [`Transaction::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub valid_asset_ids: Vec<AssetId>,
    pub invalid_asset_ids: Vec<AssetId>,
}

impl Transaction {
    /// Full validation.
    ///
    /// An asset is valid when the transaction is valid and the asset's id
    /// matches its content. When the transaction is invalid every asset is
    /// reported invalid.
    pub fn validate(&self) -> Validation {
        let valid = self.is_consistent() && self.signatures_hold();

        let mut outcome = Validation {
            valid,
            ..Validation::default()
        };
        for asset in self.assets() {
            if valid && asset.is_consistent() {
                outcome.valid_asset_ids.push(asset.asset_id);
            } else {
                outcome.invalid_asset_ids.push(asset.asset_id);
            }
        }
        outcome
    }

    /// Every signature verifies and every witness has signed.
    fn signatures_hold(&self) -> bool {
        let mut signed: HashSet<UserId> = HashSet::new();
        for entry in &self.signatures {
            if !self.verify_entry(entry) {
                return false;
            }
            signed.insert(entry.user_id);
        }
        self.body.witness.iter().all(|w| signed.contains(w))
    }

    fn verify_entry(&self, entry: &SignatureEntry) -> bool {
        let Ok(public_key) = Ed25519PublicKey::from_slice(&entry.public_key) else {
            return false;
        };
        let Ok(signature) = Ed25519Signature::from_slice(&entry.signature) else {
            return false;
        };
        public_key
            .verify(self.transaction_id.as_bytes(), &signature)
            .is_ok()
    }

    fn assets(&self) -> impl Iterator<Item = &Asset> {
        let events = self.body.events.iter().map(|e| &e.asset);
        let relations = self.body.relations.iter().filter_map(|r| r.asset.as_ref());
        events.chain(relations)
    }
}

//! # Transaction Admission
//!
//! `insert_transaction(domain, raw)`:
//!
//! 1. reject unknown domains before touching the payload
//! 2. deserialize, recompute the digest and verify every signature
//! 3. store and collect the touched asset groups
//! 4. broadcast the insertion-notification record for the domain

use dl_02_transaction_format::Transaction;
use dl_04_domain_registry::InsertedNotification;
use shared_types::{AssetGroupId, DomainId, Identifier, TransactionId};
use tracing::{debug, error};

use super::CoreService;
use crate::domain::AdmissionError;

const STATS_CATEGORY: &str = "transaction";

impl CoreService {
    /// Admit a serialized transaction into `domain_id`'s ledger.
    pub async fn insert_transaction(
        &self,
        domain_id: &DomainId,
        raw: &[u8],
    ) -> Result<TransactionId, AdmissionError> {
        self.stats.update_stats_increment(STATS_CATEGORY, "insert_count", 1);

        let Some(domain) = self.registry.get(domain_id) else {
            self.stats.update_stats_increment(STATS_CATEGORY, "insert_fail_count", 1);
            error!(domain = %domain_id.short(), "No such domain");
            return Err(AdmissionError::NoSuchDomain);
        };

        let Some(tx) = self.validate_transaction(raw) else {
            self.stats.update_stats_increment(STATS_CATEGORY, "insert_fail_count", 1);
            error!(domain = %domain_id.short(), "Bad transaction format");
            return Err(AdmissionError::BadTransaction);
        };
        debug!(
            node = %domain.name(),
            txid = %tx.transaction_id.short(),
            "insert_transaction"
        );

        let asset_group_ids = match domain.storage().insert_transaction(raw, &tx) {
            Ok(groups) => groups,
            Err(e) => {
                self.stats.update_stats_increment(STATS_CATEGORY, "insert_fail_count", 1);
                error!(node = %domain.name(), error = %e, "Fail to insert a transaction into the ledger");
                return Err(AdmissionError::StoreFailed);
            }
        };

        self.send_inserted_notification(domain_id, asset_group_ids, tx.transaction_id)
            .await;
        Ok(tx.transaction_id)
    }

    /// Parse and fully validate. Every rejection counts as `invalid`.
    fn validate_transaction(&self, raw: &[u8]) -> Option<Transaction> {
        let tx = match Transaction::deserialize(raw) {
            Ok(tx) => tx,
            Err(e) => {
                self.stats.update_stats_increment(STATS_CATEGORY, "invalid", 1);
                error!(error = %e, "Fail to deserialize transaction data");
                return None;
            }
        };

        if tx.validate().valid {
            Some(tx)
        } else {
            self.stats.update_stats_increment(STATS_CATEGORY, "invalid", 1);
            None
        }
    }

    async fn send_inserted_notification(
        &self,
        domain_id: &DomainId,
        asset_group_ids: Vec<AssetGroupId>,
        transaction_id: TransactionId,
    ) {
        let record = InsertedNotification::new(transaction_id, *domain_id, asset_group_ids);
        self.broadcaster
            .broadcast_notification(domain_id, record.encode())
            .await;
    }
}

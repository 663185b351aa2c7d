//! # Search
//!
//! Exact lookup, conditional search and counting. Every stored object is
//! re-checked before it is returned: an object whose recomputed id differs
//! from the id it was stored under, or that no longer validates, is
//! reported as compromised instead of valid. Hits carry the bytes the
//! transaction was admitted with.

use dl_03_ledger_storage::{SearchFilter, StoredTransaction};
use shared_types::{DomainId, Identifier, TransactionId};
use tracing::{error, warn};

use super::CoreService;

/// Serialized search hits split by classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub transactions: Vec<Vec<u8>>,
    pub compromised_transactions: Vec<Vec<u8>>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.compromised_transactions.is_empty()
    }
}

/// Outcome of an exact lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxidSearch {
    Valid(Vec<u8>),
    Compromised(Vec<u8>),
}

/// Classify stored transactions by whether their id and signatures still hold.
pub(crate) fn create_search_result(found: Vec<StoredTransaction>) -> SearchResult {
    let mut result = SearchResult::default();
    for stored in found {
        let tx = &stored.transaction;
        let id_holds = matches!(tx.digest(), Ok(digest) if digest == stored.transaction_id);
        if id_holds && tx.validate().valid {
            result.transactions.push(stored.raw);
        } else {
            warn!(txid = %stored.transaction_id.short(), "Stored transaction is compromised");
            result.compromised_transactions.push(stored.raw);
        }
    }
    result
}

impl CoreService {
    /// Look a transaction up by id. `None` when the domain or the
    /// transaction is unknown.
    pub fn search_transaction_by_txid(
        &self,
        domain_id: &DomainId,
        transaction_id: &TransactionId,
    ) -> Option<TxidSearch> {
        self.stats.update_stats_increment("transaction", "search_count", 1);
        let Some(domain) = self.registry.get(domain_id) else {
            error!(domain = %domain_id.short(), "No such domain");
            return None;
        };

        let found = match domain.storage().search_by_id(transaction_id) {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(e) => {
                warn!(domain = %domain_id.short(), error = %e, "Search failed");
                return None;
            }
        };

        let mut result = create_search_result(vec![found]);
        if let Some(data) = result.transactions.pop() {
            Some(TxidSearch::Valid(data))
        } else {
            result.compromised_transactions.pop().map(TxidSearch::Compromised)
        }
    }

    /// Search by ANDed conditions. `None` when the domain is unknown or
    /// nothing matched.
    pub fn search_transaction_with_condition(
        &self,
        domain_id: &DomainId,
        filter: &SearchFilter,
    ) -> Option<SearchResult> {
        let Some(domain) = self.registry.get(domain_id) else {
            error!(domain = %domain_id.short(), "No such domain");
            return None;
        };

        match domain.storage().search_with_conditions(filter) {
            Ok(found) if !found.is_empty() => Some(create_search_result(found)),
            Ok(_) => None,
            Err(e) => {
                warn!(domain = %domain_id.short(), error = %e, "Search failed");
                None
            }
        }
    }

    /// Number of matching asset rows. `None` when the domain is unknown.
    pub fn count_transactions(&self, domain_id: &DomainId, filter: &SearchFilter) -> Option<u64> {
        let Some(domain) = self.registry.get(domain_id) else {
            error!(domain = %domain_id.short(), "No such domain");
            return None;
        };
        match domain.storage().count_transactions(filter) {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(domain = %domain_id.short(), error = %e, "Count failed");
                None
            }
        }
    }
}

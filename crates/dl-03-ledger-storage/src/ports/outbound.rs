//! # Outbound Ports (Driven Ports)
//!
//! The storage interface the core consumes, and the factory the domain
//! registry uses to obtain one handle per domain.

use dl_02_transaction_format::{AssetRecord, Transaction};
use shared_types::{AssetGroupId, DomainId, TransactionId};
use std::sync::Arc;

use crate::domain::{SearchFilter, StorageConfig, StorageError, StoredTransaction, TopologyEdge};

/// Per-domain transaction store.
///
/// Implementations must be safe for concurrent use from every connection
/// task.
pub trait LedgerStorage: Send + Sync {
    /// Store a validated transaction together with the bytes it arrived as.
    ///
    /// ## Returns
    ///
    /// The distinct asset-group ids touched, in first-seen order.
    fn insert_transaction(
        &self,
        raw: &[u8],
        tx: &Transaction,
    ) -> Result<Vec<AssetGroupId>, StorageError>;

    /// Exact lookup. The returned id is the key the object was stored under.
    fn search_by_id(&self, id: &TransactionId) -> Result<Option<StoredTransaction>, StorageError>;

    /// Distinct transactions owning the first `filter.count` matching asset
    /// rows, in `filter.direction` order.
    fn search_with_conditions(
        &self,
        filter: &SearchFilter,
    ) -> Result<Vec<StoredTransaction>, StorageError>;

    /// Number of matching asset rows. `filter.count` and `filter.direction`
    /// are ignored.
    fn count_transactions(&self, filter: &SearchFilter) -> Result<u64, StorageError>;

    /// Edges with `base == id` (toward the past) or `point_to == id`
    /// (toward the future).
    fn search_transaction_topology(
        &self,
        id: &TransactionId,
        toward_past: bool,
    ) -> Result<Vec<TopologyEdge>, StorageError>;

    /// Asset rows of a transaction object.
    fn get_asset_info(&self, tx: &Transaction) -> Vec<AssetRecord> {
        tx.asset_records()
    }

    /// Detach the handle. Later calls fail with [`StorageError::Closed`].
    fn close(&self);
}

/// Opens storage handles for domains.
pub trait StorageFactory: Send + Sync {
    fn open(
        &self,
        domain_id: &DomainId,
        config: &StorageConfig,
    ) -> Result<Arc<dyn LedgerStorage>, StorageError>;
}

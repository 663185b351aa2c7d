//! # In-Memory Storage Engine
//!
//! All tables live behind one `parking_lot::RwLock`, so an insert is
//! atomic with respect to concurrent searches.

use dl_02_transaction_format::Transaction;
use parking_lot::RwLock;
use shared_types::{AssetGroupId, AssetId, DomainId, Identifier, TransactionId, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{SearchFilter, StorageConfig, StorageError, StoredTransaction, TopologyEdge};
use crate::ports::{LedgerStorage, StorageFactory};

#[derive(Debug, Clone)]
struct AssetRow {
    asset_group_id: AssetGroupId,
    asset_id: AssetId,
    user_id: UserId,
    transaction_id: TransactionId,
}

#[derive(Default)]
struct Tables {
    transactions: HashMap<TransactionId, StoredTransaction>,
    asset_rows: Vec<AssetRow>,
    edges: Vec<TopologyEdge>,
    closed: bool,
}

/// Volatile storage for one domain.
#[derive(Default)]
pub struct InMemoryLedgerStorage {
    tables: RwLock<Tables>,
}

impl InMemoryLedgerStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored transactions.
    pub fn len(&self) -> usize {
        self.tables.read().transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Tables {
    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.closed {
            Err(StorageError::Closed)
        } else {
            Ok(())
        }
    }

    fn matching_rows<'a>(&'a self, filter: &'a SearchFilter) -> impl Iterator<Item = &'a AssetRow> {
        self.asset_rows
            .iter()
            .filter(move |r| filter.matches(&r.asset_group_id, &r.asset_id, &r.user_id))
    }
}

impl LedgerStorage for InMemoryLedgerStorage {
    fn insert_transaction(
        &self,
        raw: &[u8],
        tx: &Transaction,
    ) -> Result<Vec<AssetGroupId>, StorageError> {
        let mut tables = self.tables.write();
        tables.ensure_open()?;

        let id = tx.transaction_id;
        if tables.transactions.contains_key(&id) {
            return Err(StorageError::Duplicate(id));
        }

        let mut groups: Vec<AssetGroupId> = Vec::new();
        for record in tx.asset_records() {
            if !groups.contains(&record.asset_group_id) {
                groups.push(record.asset_group_id);
            }
            tables.asset_rows.push(AssetRow {
                asset_group_id: record.asset_group_id,
                asset_id: record.asset_id,
                user_id: record.user_id,
                transaction_id: id,
            });
        }
        for point_to in tx.topology_edges() {
            tables.edges.push(TopologyEdge { base: id, point_to });
        }
        tables.transactions.insert(
            id,
            StoredTransaction {
                transaction_id: id,
                raw: raw.to_vec(),
                transaction: tx.clone(),
            },
        );

        debug!(txid = %id.short(), groups = groups.len(), "Transaction stored");
        Ok(groups)
    }

    fn search_by_id(&self, id: &TransactionId) -> Result<Option<StoredTransaction>, StorageError> {
        let tables = self.tables.read();
        tables.ensure_open()?;
        Ok(tables.transactions.get(id).cloned())
    }

    fn search_with_conditions(
        &self,
        filter: &SearchFilter,
    ) -> Result<Vec<StoredTransaction>, StorageError> {
        let tables = self.tables.read();
        tables.ensure_open()?;

        let rows: Vec<&AssetRow> = if filter.newest_first() {
            tables.matching_rows(filter).collect::<Vec<_>>().into_iter().rev().collect()
        } else {
            tables.matching_rows(filter).collect()
        };

        let mut ids: Vec<TransactionId> = Vec::new();
        for row in rows.into_iter().take(filter.count) {
            if !ids.contains(&row.transaction_id) {
                ids.push(row.transaction_id);
            }
        }
        Ok(ids
            .into_iter()
            .filter_map(|id| tables.transactions.get(&id).cloned())
            .collect())
    }

    fn count_transactions(&self, filter: &SearchFilter) -> Result<u64, StorageError> {
        let tables = self.tables.read();
        tables.ensure_open()?;
        Ok(tables.matching_rows(filter).count() as u64)
    }

    fn search_transaction_topology(
        &self,
        id: &TransactionId,
        toward_past: bool,
    ) -> Result<Vec<TopologyEdge>, StorageError> {
        let tables = self.tables.read();
        tables.ensure_open()?;
        Ok(tables
            .edges
            .iter()
            .filter(|e| if toward_past { &e.base == id } else { &e.point_to == id })
            .copied()
            .collect())
    }

    fn close(&self) {
        let mut tables = self.tables.write();
        *tables = Tables {
            closed: true,
            ..Tables::default()
        };
    }
}

/// Factory handing out a fresh in-memory engine per domain.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryStorageFactory;

impl StorageFactory for MemoryStorageFactory {
    fn open(
        &self,
        domain_id: &DomainId,
        config: &StorageConfig,
    ) -> Result<Arc<dyn LedgerStorage>, StorageError> {
        match config {
            StorageConfig::Memory => {
                debug!(domain = %domain_id.short(), "Opening in-memory storage");
                Ok(Arc::new(InMemoryLedgerStorage::new()))
            }
        }
    }
}

//! # Value Objects

use dl_02_transaction_format::Transaction;
use serde::{Deserialize, Serialize};
use shared_types::{AssetGroupId, AssetId, TransactionId, UserId};

/// Newest rows first.
pub const DIRECTION_DESCEND: i64 = 0;
/// Oldest rows first.
pub const DIRECTION_ASCEND: i64 = 1;

/// AND-combined conditions over asset rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub asset_group_id: Option<AssetGroupId>,
    pub asset_id: Option<AssetId>,
    pub user_id: Option<UserId>,
    /// [`DIRECTION_DESCEND`] or [`DIRECTION_ASCEND`]; anything else ascends.
    pub direction: i64,
    /// Maximum number of asset rows considered.
    pub count: usize,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            asset_group_id: None,
            asset_id: None,
            user_id: None,
            direction: DIRECTION_DESCEND,
            count: 1,
        }
    }
}

impl SearchFilter {
    pub fn matches(
        &self,
        asset_group_id: &AssetGroupId,
        asset_id: &AssetId,
        user_id: &UserId,
    ) -> bool {
        self.asset_group_id.as_ref().map_or(true, |g| g == asset_group_id)
            && self.asset_id.as_ref().map_or(true, |a| a == asset_id)
            && self.user_id.as_ref().map_or(true, |u| u == user_id)
    }

    pub fn newest_first(&self) -> bool {
        self.direction == DIRECTION_DESCEND
    }
}

/// `base` points at the earlier transaction `point_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyEdge {
    pub base: TransactionId,
    pub point_to: TransactionId,
}

impl TopologyEdge {
    /// Transaction reached by following this edge in the given direction.
    pub fn neighbour(&self, toward_past: bool) -> TransactionId {
        if toward_past {
            self.point_to
        } else {
            self.base
        }
    }
}

/// A transaction as storage holds it: the id it was stored under, the bytes
/// it was admitted with and the parsed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTransaction {
    pub transaction_id: TransactionId,
    pub raw: Vec<u8>,
    pub transaction: Transaction,
}

/// Storage section of a domain's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    #[default]
    Memory,
}

//! # Graph Traversal
//!
//! Breadth-first walk over topology edges starting at one transaction.
//!
//! - the start is visited first and counts toward the budget, but is not
//!   part of the tree: layer `i` holds transactions `i + 1` hops away
//! - at most [`TX_TRAVERSAL_MAX`] distinct transactions are visited and at
//!   most `2 * TX_TRAVERSAL_MAX` hops are expanded; hitting either bound
//!   clears `all_included`
//! - filters decide tree membership only, every resolved transaction is
//!   still expanded

use dl_02_transaction_format::Transaction;
use dl_03_ledger_storage::LedgerStorage;
use shared_types::{AssetGroupId, DomainId, Identifier, TransactionId, UserId};
use std::collections::HashSet;
use tracing::{debug, error, warn};

use super::CoreService;

/// Ceiling on distinct transactions visited by one traversal.
pub const TX_TRAVERSAL_MAX: usize = 30;

const MAX_HOPS: i64 = (TX_TRAVERSAL_MAX * 2) as i64;

/// Direction value that walks toward earlier transactions.
pub const DIRECTION_PAST: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalQuery {
    pub start: TransactionId,
    pub asset_group_id: Option<AssetGroupId>,
    pub user_id: Option<UserId>,
    pub direction: i64,
    pub hop_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalResult {
    pub all_included: bool,
    /// Serialized transactions per hop.
    pub tree: Vec<Vec<Vec<u8>>>,
}

impl TraversalQuery {
    fn keeps(&self, tx: &Transaction) -> bool {
        if self.asset_group_id.is_none() && self.user_id.is_none() {
            return true;
        }
        tx.matches_filter(self.asset_group_id.as_ref(), self.user_id.as_ref())
    }

    fn toward_past(&self) -> bool {
        self.direction == DIRECTION_PAST
    }
}

impl CoreService {
    /// Walk the topology around `query.start`. `None` when the domain is
    /// unknown or storage fails on the start lookup.
    pub fn traverse_transactions(
        &self,
        domain_id: &DomainId,
        query: &TraversalQuery,
    ) -> Option<TraversalResult> {
        self.stats.update_stats_increment("transaction", "search_count", 1);
        let Some(domain) = self.registry.get(domain_id) else {
            error!(domain = %domain_id.short(), "No such domain");
            return None;
        };
        let storage = domain.storage();

        let mut result = TraversalResult {
            all_included: true,
            tree: Vec::new(),
        };
        match storage.search_by_id(&query.start) {
            Ok(Some(_)) => {}
            Ok(None) => return Some(result),
            Err(e) => {
                warn!(domain = %domain_id.short(), error = %e, "Traversal start lookup failed");
                return None;
            }
        }

        let mut hop_count = query.hop_count;
        if hop_count > MAX_HOPS {
            hop_count = MAX_HOPS;
            result.all_included = false;
        }

        let mut visited: HashSet<TransactionId> = HashSet::from([query.start]);
        let mut frontier = vec![query.start];

        for _ in 0..hop_count.max(0) {
            let candidates = next_layer(storage.as_ref(), &frontier, query.toward_past(), &visited);
            if candidates.is_empty() {
                break;
            }
            if visited.len() + candidates.len() > TX_TRAVERSAL_MAX {
                result.all_included = false;
                break;
            }

            let mut layer = Vec::new();
            frontier.clear();
            for id in candidates {
                visited.insert(id);
                let stored = match storage.search_by_id(&id) {
                    Ok(Some(stored)) => stored,
                    Ok(None) => continue,
                    Err(e) => {
                        debug!(txid = %id.short(), error = %e, "Skipping unreadable transaction");
                        continue;
                    }
                };
                frontier.push(id);
                if query.keeps(&stored.transaction) {
                    layer.push(stored.raw);
                }
            }
            if !layer.is_empty() {
                result.tree.push(layer);
            }
        }

        Some(result)
    }
}

/// Unvisited neighbours of `frontier`, de-duplicated in discovery order.
fn next_layer(
    storage: &dyn LedgerStorage,
    frontier: &[TransactionId],
    toward_past: bool,
    visited: &HashSet<TransactionId>,
) -> Vec<TransactionId> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for id in frontier {
        let edges = match storage.search_transaction_topology(id, toward_past) {
            Ok(edges) => edges,
            Err(e) => {
                debug!(txid = %id.short(), error = %e, "Topology lookup failed");
                continue;
            }
        };
        for edge in edges {
            let next = edge.neighbour(toward_past);
            if !visited.contains(&next) && seen.insert(next) {
                candidates.push(next);
            }
        }
    }
    candidates
}

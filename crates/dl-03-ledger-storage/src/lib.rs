//! # Ledger Storage (dl-03)
//!
//! Persists admitted transactions for one domain and answers the raw
//! queries the core needs: lookup by id, conditional search over asset rows,
//! counting, and graph adjacency for traversal.
//!
//! ## Tables
//!
//! | Table | Row | Written by |
//! |-------|-----|------------|
//! | transactions | `id -> (raw bytes, parsed object)` | insert |
//! | asset rows | `(asset_group_id, asset_id, user_id, id)` in insertion order | insert |
//! | topology | `(base, point_to)` edge per referenced prior transaction | insert |
//!
//! Transactions are immutable once inserted; inserting an id twice fails.
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): filters, edges, storage config, errors
//! - **Ports Layer** (`ports/`): `LedgerStorage` and `StorageFactory`
//! - **Adapters Layer** (`adapters/`): in-memory engine

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::{InMemoryLedgerStorage, MemoryStorageFactory};
pub use domain::{SearchFilter, StorageConfig, StorageError, StoredTransaction, TopologyEdge};
pub use ports::{LedgerStorage, StorageFactory};

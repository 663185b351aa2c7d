//! # Transaction Format (dl-02)
//!
//! The ledger's transaction object: construction, binary serialisation,
//! content digest and signature validation.
//!
//! ## Identity
//!
//! A transaction id is `SHA-256(bincode(body))`. The serialized form carries
//! the id the author *declared*; [`Transaction::digest`] recomputes it.
//! A transaction whose declared id differs from its digest is compromised
//! and never validates.
//!
//! ## Validation
//!
//! [`Transaction::validate`] holds when:
//!
//! 1. the declared id equals the recomputed digest,
//! 2. every witness has a signature entry, and
//! 3. every signature entry verifies over the transaction id.
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): entities, builder and validation; the
//!   only I/O is in-memory bincode encoding

pub mod domain;

pub use domain::{
    Asset, AssetRecord, Event, Pointer, Reference, Relation, SignatureEntry, Transaction,
    TransactionBody, TransactionBuilder, TransactionError, Validation, MAX_TRANSACTION_SIZE,
};

//! # Adapters Layer

pub mod memory;

pub use memory::{InMemoryLedgerStorage, MemoryStorageFactory};

//! # Shared Types Crate
//!
//! Contains the vocabulary every ledger crate speaks: fixed-length
//! identifiers, protocol status codes, the closed set of typed message keys,
//! the command tags and the keyed [`Message`] record itself.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Wire codes for keys and commands are defined
//!   exactly once, here. The codec and the dispatcher never hard-code numbers.
//! - **Typed Keys**: Every [`KeyType`] declares the [`ValueKind`] it carries,
//!   so a decoded message can never hold an integer where bytes are expected.
//! - **Strong Identifiers**: Domains, users, transactions and asset groups are
//!   distinct newtypes over 32 bytes and cannot be mixed up.

pub mod commands;
pub mod entities;
pub mod errors;
pub mod keys;
pub mod message;

pub use commands::Command;
pub use entities::*;
pub use errors::*;
pub use keys::{KeyType, ValueKind};
pub use message::{Message, Value};

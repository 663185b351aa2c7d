//! # Core Service (dl-05)
//!
//! The protocol engine of a ledger node: accepts client connections, decodes
//! messages, dispatches them by command and answers through the socket or
//! the addressed user's routing entry.
//!
//! ## Operations
//!
//! | Command | Operation | Reply |
//! |---------|-----------|-------|
//! | `REQUEST_INSERT` | `insert_transaction` | `RESPONSE_INSERT` (routed) |
//! | `REQUEST_SEARCH_TRANSACTION` | `search_transaction_by_txid` | `RESPONSE_SEARCH_TRANSACTION` (routed) |
//! | `REQUEST_SEARCH_WITH_CONDITIONS` | `search_transaction_with_condition` | `RESPONSE_SEARCH_WITH_CONDITIONS` (routed) |
//! | `REQUEST_COUNT_TRANSACTIONS` | `count_transactions` | `RESPONSE_COUNT_TRANSACTIONS` (routed) |
//! | `REQUEST_TRAVERSE_TRANSACTIONS` | `traverse_transactions` | `RESPONSE_TRAVERSE_TRANSACTIONS` (routed) |
//! | `REQUEST_GATHER_SIGNATURE` | `distribute_transaction_to_gather_signatures` | fan-out of `REQUEST_SIGNATURE` |
//! | `RESPONSE_SIGNATURE` | `relay_signature_response` | `RESPONSE_GATHER_SIGNATURE` (routed) |
//! | `REQUEST_GET_*`, setup/close domain | introspection, registry | direct |
//!
//! ## Status Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | `ESUCCESS` (0) | ok |
//! | `EOTHER` (-1) | relayed failure without a status |
//! | `EINVALID_COMMAND` (-2) | missing or malformed parameters, admission failure |
//! | `ENOTRANSACTION` (-3) | nothing found |
//! | `EBADTRANSACTION` (-4) | found, but the stored object is compromised |
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): config, reply construction, errors
//! - **Ports Layer** (`ports/`): `NotificationBroadcaster`, `ConfigStore`
//! - **Service** (`service/`): `CoreService` and the protocol operations
//! - **Adapters Layer** (`adapters/`): TCP server, connection tasks, bus
//!   broadcaster, JSON config file

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{BusBroadcaster, CoreServer, JsonConfigStore, CONFIG_FILE_NAME};
pub use domain::{
    AdmissionError, ClientConfig, ConfigError, CoreConfig, ServiceError, DEFAULT_CORE_PORT,
    DEFAULT_POOL_SIZE,
};
pub use ports::{ConfigStore, NotificationBroadcaster};
pub use service::{
    ConnectionContext, CoreService, Flow, SearchResult, TraversalQuery, TraversalResult,
    TxidSearch, DIRECTION_PAST, TX_TRAVERSAL_MAX,
};

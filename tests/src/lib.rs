//! # Ledger Node Test Suite
//!
//! End-to-end flows against a node serving on an ephemeral localhost port,
//! driven by framed TCP clients.
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs          # node + client fixtures
//!     ├── ledger_flows.rs     # insert, search, count, traverse
//!     ├── gathering_flows.rs  # signature gathering, messaging
//!     └── domain_flows.rs     # setup/close, notifications, introspection
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dl-tests
//! ```

pub mod integration;

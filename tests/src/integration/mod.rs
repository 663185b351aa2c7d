//! Cross-crate flows over real sockets.

#[cfg(test)]
pub mod harness;

#[cfg(test)]
mod domain_flows;
#[cfg(test)]
mod gathering_flows;
#[cfg(test)]
mod ledger_flows;

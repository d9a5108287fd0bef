//! Card Rebalance - applies declarative balance changes to a host's card pool
//!
//! A run loads a change document, discovers every card-like record the host
//! exposes, resolves each change to one card by name and writes the new
//! numbers, effect text and keywords onto it.

pub mod changes;
pub mod core;
pub mod host;
pub mod json;
pub mod locator;
pub mod mutator;
pub mod orchestrator;
pub mod resolver;

pub use crate::core::config::BalanceConfig;
pub use crate::orchestrator::{run, run_changes, RunSummary};

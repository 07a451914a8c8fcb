//! Core of the affiliate program client.
//!
//! Validation, eligibility rules, response normalization and the query
//! adapters live here. Transport and identity state sit behind ports (traits)
//! implemented in adapter crates.

pub mod config;
pub mod cursor;
pub mod domain;
pub mod eligibility;
pub mod errors;
pub mod logging;
pub mod manager;
pub mod ports;
pub mod program;
mod queries;
pub mod registry;
pub mod wire;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
pub use manager::AffiliateProgramManager;

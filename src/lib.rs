//! Launchpad contributor library
//!
//! Browses launchpad campaigns across protocol versions and submits
//! contribution transactions through a simulation-budgeted pipeline.

pub mod config;
pub mod launch;
pub mod metadata;
pub mod metrics;
pub mod observability;
pub mod rpc;
pub mod test_utils;
pub mod tx_builder;
pub mod wallet;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};

//! Chain client seam
//!
//! The submission pipeline talks to the chain only through [`ChainClient`].
//! [`RpcChainClient`] implements it over the nonblocking Solana RPC client;
//! tests use the scriptable mock in `test_utils`.

pub mod client;
pub mod errors;

use async_trait::async_trait;
use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount, commitment_config::CommitmentLevel,
    hash::Hash, pubkey::Pubkey, signature::Signature, transaction::VersionedTransaction,
};

pub use client::RpcChainClient;
pub use errors::ChainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    pub sig_verify: bool,
    pub replace_recent_blockhash: bool,
    pub commitment: CommitmentLevel,
}

impl SimulationConfig {
    /// Unsigned draft simulation: no signature check, node may swap the blockhash.
    pub fn unsigned_draft(commitment: CommitmentLevel) -> Self {
        Self {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationOutcome {
    /// Execution error, rendered as text
    pub err: Option<String>,
    pub logs: Option<Vec<String>>,
    pub units_consumed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendConfig {
    pub skip_preflight: bool,
    pub preflight_commitment: CommitmentLevel,
}

/// Expiry-bounded confirmation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationStrategy {
    pub signature: Signature,
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_latest_blockhash(
        &self,
        commitment: CommitmentLevel,
    ) -> Result<LatestBlockhash, ChainError>;

    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
        config: SimulationConfig,
    ) -> Result<SimulationOutcome, ChainError>;

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
        config: SendConfig,
    ) -> Result<Signature, ChainError>;

    /// Wait until `strategy.signature` reaches `commitment` or the
    /// blockhash expires. Never resubmits.
    async fn confirm_transaction(
        &self,
        strategy: ConfirmationStrategy,
        commitment: CommitmentLevel,
    ) -> Result<(), ChainError>;

    /// `Ok(None)` when the table account does not exist.
    async fn get_address_lookup_table(
        &self,
        address: &Pubkey,
    ) -> Result<Option<AddressLookupTableAccount>, ChainError>;
}

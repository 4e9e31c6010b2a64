use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig};
use solana_sdk::{
    address_lookup_table::{state::AddressLookupTable, AddressLookupTableAccount},
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use solana_transaction_status::TransactionStatus;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{
    ChainClient, ChainError, ConfirmationStrategy, LatestBlockhash, SendConfig, SimulationConfig,
    SimulationOutcome,
};

/// Where a signature stands relative to a commitment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StatusCheck {
    /// Not seen yet, or seen below the target commitment
    Pending,
    Reached,
    Failed(String),
}

pub(crate) fn check_status(status: Option<&TransactionStatus>, commitment: CommitmentLevel) -> StatusCheck {
    let Some(status) = status else {
        return StatusCheck::Pending;
    };
    if let Some(err) = &status.err {
        return StatusCheck::Failed(format!("{:?}", err));
    }
    if status.satisfies_commitment(CommitmentConfig { commitment }) {
        StatusCheck::Reached
    } else {
        StatusCheck::Pending
    }
}

/// [`ChainClient`] over the nonblocking Solana RPC client.
pub struct RpcChainClient {
    rpc: Arc<RpcClient>,
    /// Commitment for reads that take none (lookup tables, block height)
    commitment: CommitmentLevel,
    poll_interval: Duration,
}

impl RpcChainClient {
    pub fn new(
        url: impl Into<String>,
        commitment: CommitmentLevel,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        let rpc = RpcClient::new_with_timeout_and_commitment(
            url.into(),
            timeout,
            CommitmentConfig { commitment },
        );
        Self {
            rpc: Arc::new(rpc),
            commitment,
            poll_interval,
        }
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn get_latest_blockhash(
        &self,
        commitment: CommitmentLevel,
    ) -> Result<LatestBlockhash, ChainError> {
        let (blockhash, last_valid_block_height) = self
            .rpc
            .get_latest_blockhash_with_commitment(CommitmentConfig { commitment })
            .await?;
        Ok(LatestBlockhash {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
        config: SimulationConfig,
    ) -> Result<SimulationOutcome, ChainError> {
        let rpc_config = RpcSimulateTransactionConfig {
            sig_verify: config.sig_verify,
            replace_recent_blockhash: config.replace_recent_blockhash,
            commitment: Some(CommitmentConfig {
                commitment: config.commitment,
            }),
            ..RpcSimulateTransactionConfig::default()
        };
        let response = self
            .rpc
            .simulate_transaction_with_config(transaction, rpc_config)
            .await?;
        let result = response.value;
        Ok(SimulationOutcome {
            err: result.err.map(|e| format!("{:?}", e)),
            logs: result.logs,
            units_consumed: result.units_consumed,
        })
    }

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
        config: SendConfig,
    ) -> Result<Signature, ChainError> {
        let rpc_config = RpcSendTransactionConfig {
            skip_preflight: config.skip_preflight,
            preflight_commitment: Some(config.preflight_commitment),
            ..RpcSendTransactionConfig::default()
        };
        Ok(self
            .rpc
            .send_transaction_with_config(transaction, rpc_config)
            .await?)
    }

    async fn confirm_transaction(
        &self,
        strategy: ConfirmationStrategy,
        commitment: CommitmentLevel,
    ) -> Result<(), ChainError> {
        let started = Instant::now();
        let mut polls: u32 = 0;
        loop {
            polls += 1;
            let statuses = self
                .rpc
                .get_signature_statuses(&[strategy.signature])
                .await?
                .value;
            match check_status(statuses.first().and_then(Option::as_ref), commitment) {
                StatusCheck::Reached => {
                    debug!(
                        signature = %strategy.signature,
                        polls,
                        latency_ms = started.elapsed().as_millis() as u64,
                        "Transaction confirmed"
                    );
                    return Ok(());
                }
                StatusCheck::Failed(message) => {
                    warn!(signature = %strategy.signature, error = %message, "Transaction failed on chain");
                    return Err(ChainError::ExecutionFailed { message });
                }
                StatusCheck::Pending => {}
            }

            let height = self
                .rpc
                .get_block_height_with_commitment(CommitmentConfig {
                    commitment: self.commitment,
                })
                .await?;
            if height > strategy.last_valid_block_height {
                return Err(ChainError::TransactionExpired {
                    message: format!(
                        "block height exceeded: signature {} not confirmed by height {} (now {})",
                        strategy.signature, strategy.last_valid_block_height, height
                    ),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn get_address_lookup_table(
        &self,
        address: &Pubkey,
    ) -> Result<Option<AddressLookupTableAccount>, ChainError> {
        let account = self
            .rpc
            .get_account_with_commitment(address, CommitmentConfig {
                commitment: self.commitment,
            })
            .await?
            .value;
        let Some(account) = account else {
            return Ok(None);
        };
        let table = AddressLookupTable::deserialize(&account.data)
            .map_err(|e| ChainError::Decode(format!("lookup table {}: {}", address, e)))?;
        Ok(Some(AddressLookupTableAccount {
            key: *address,
            addresses: table.addresses.to_vec(),
        }))
    }
}

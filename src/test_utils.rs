//! Test Utilities Module
//!
//! Scriptable stand-ins for the chain client and the wallet, so the
//! submission pipeline can be driven deterministically without a node.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use async_trait::async_trait;
use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount,
    commitment_config::CommitmentLevel,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::VersionedTransaction,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::rpc::{
    ChainClient, ChainError, ConfirmationStrategy, LatestBlockhash, SendConfig, SimulationConfig,
    SimulationOutcome,
};
use crate::wallet::{KeypairWallet, WalletError, WalletSigner};

/// One recorded call against [`MockChainClient`]
#[derive(Debug, Clone, PartialEq)]
pub enum ChainCall {
    GetLatestBlockhash(CommitmentLevel),
    Simulate(SimulationConfig),
    Send(SendConfig),
    Confirm(ConfirmationStrategy, CommitmentLevel),
    GetLookupTable(Pubkey),
}

/// Mock chain client
///
/// Every call is recorded. Results are scripted per method; blockhashes are
/// fresh on every call unless a failure is scripted.
#[derive(Clone)]
pub struct MockChainClient {
    pub blockhash_error: Arc<Mutex<Option<ChainError>>>,
    pub simulation: Arc<Mutex<Result<SimulationOutcome, ChainError>>>,
    pub send_result: Arc<Mutex<Result<Signature, ChainError>>>,
    pub confirm_result: Arc<Mutex<Result<(), ChainError>>>,
    pub lookup_tables: Arc<Mutex<HashMap<Pubkey, AddressLookupTableAccount>>>,
    pub failing_tables: Arc<Mutex<HashSet<Pubkey>>>,

    pub calls: Arc<Mutex<Vec<ChainCall>>>,
    pub simulated: Arc<Mutex<Vec<VersionedTransaction>>>,
    pub sent: Arc<Mutex<Vec<VersionedTransaction>>>,
    pub last_valid_block_height: u64,
}

impl MockChainClient {
    /// Client whose simulation consumes `200_000` units and whose sends land.
    pub fn new() -> Self {
        Self {
            blockhash_error: Arc::new(Mutex::new(None)),
            simulation: Arc::new(Mutex::new(Ok(SimulationOutcome {
                err: None,
                logs: Some(vec![
                    "Program ComputeBudget111111111111111111111111111111 invoke [1]".to_string(),
                    "Program ComputeBudget111111111111111111111111111111 success".to_string(),
                ]),
                units_consumed: Some(200_000),
            }))),
            send_result: Arc::new(Mutex::new(Ok(Signature::from([7u8; 64])))),
            confirm_result: Arc::new(Mutex::new(Ok(()))),
            lookup_tables: Arc::new(Mutex::new(HashMap::new())),
            failing_tables: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            simulated: Arc::new(Mutex::new(Vec::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            last_valid_block_height: 1_000,
        }
    }

    pub async fn set_simulation(&self, outcome: Result<SimulationOutcome, ChainError>) {
        *self.simulation.lock().await = outcome;
    }

    pub async fn set_units_consumed(&self, units: Option<u64>) {
        if let Ok(outcome) = self.simulation.lock().await.as_mut() {
            outcome.units_consumed = units;
        }
    }

    pub async fn set_blockhash_error(&self, error: Option<ChainError>) {
        *self.blockhash_error.lock().await = error;
    }

    pub async fn set_send_result(&self, result: Result<Signature, ChainError>) {
        *self.send_result.lock().await = result;
    }

    pub async fn set_confirm_result(&self, result: Result<(), ChainError>) {
        *self.confirm_result.lock().await = result;
    }

    pub async fn add_lookup_table(&self, table: AddressLookupTableAccount) {
        self.lookup_tables.lock().await.insert(table.key, table);
    }

    pub async fn fail_lookup_table(&self, address: Pubkey) {
        self.failing_tables.lock().await.insert(address);
    }

    pub async fn calls(&self) -> Vec<ChainCall> {
        self.calls.lock().await.clone()
    }

    /// Calls that reach the network, i.e. everything recorded.
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn send_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn simulation_count(&self) -> usize {
        self.simulated.lock().await.len()
    }

    pub async fn last_sent(&self) -> Option<VersionedTransaction> {
        self.sent.lock().await.last().cloned()
    }

    async fn record(&self, call: ChainCall) {
        self.calls.lock().await.push(call);
    }
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn get_latest_blockhash(
        &self,
        commitment: CommitmentLevel,
    ) -> Result<LatestBlockhash, ChainError> {
        self.record(ChainCall::GetLatestBlockhash(commitment)).await;
        if let Some(err) = self.blockhash_error.lock().await.clone() {
            return Err(err);
        }
        Ok(LatestBlockhash {
            blockhash: Hash::new_unique(),
            last_valid_block_height: self.last_valid_block_height,
        })
    }

    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
        config: SimulationConfig,
    ) -> Result<SimulationOutcome, ChainError> {
        self.record(ChainCall::Simulate(config)).await;
        self.simulated.lock().await.push(transaction.clone());
        self.simulation.lock().await.clone()
    }

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
        config: SendConfig,
    ) -> Result<Signature, ChainError> {
        self.record(ChainCall::Send(config)).await;
        self.sent.lock().await.push(transaction.clone());
        self.send_result.lock().await.clone()
    }

    async fn confirm_transaction(
        &self,
        strategy: ConfirmationStrategy,
        commitment: CommitmentLevel,
    ) -> Result<(), ChainError> {
        self.record(ChainCall::Confirm(strategy, commitment)).await;
        self.confirm_result.lock().await.clone()
    }

    async fn get_address_lookup_table(
        &self,
        address: &Pubkey,
    ) -> Result<Option<AddressLookupTableAccount>, ChainError> {
        self.record(ChainCall::GetLookupTable(*address)).await;
        if self.failing_tables.lock().await.contains(address) {
            return Err(ChainError::Transport {
                message: format!("connection reset while fetching {}", address),
            });
        }
        Ok(self.lookup_tables.lock().await.get(address).cloned())
    }
}

/// Mock wallet
///
/// Signs with a real keypair unless disconnected or scripted to fail.
#[derive(Clone)]
pub struct MockWallet {
    signer: Option<Arc<KeypairWallet>>,
    pub sign_error: Arc<Mutex<Option<WalletError>>>,
    pub sign_count: Arc<Mutex<usize>>,
}

impl MockWallet {
    /// Connected wallet with a fresh keypair
    pub fn new() -> Self {
        Self::with_keypair(Keypair::new())
    }

    pub fn with_keypair(keypair: Keypair) -> Self {
        Self {
            signer: Some(Arc::new(KeypairWallet::from_keypair(keypair))),
            sign_error: Arc::new(Mutex::new(None)),
            sign_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Wallet with no public key
    pub fn disconnected() -> Self {
        Self {
            signer: None,
            sign_error: Arc::new(Mutex::new(None)),
            sign_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Connected wallet whose every signature request fails with `error`
    pub fn failing(error: WalletError) -> Self {
        let mut wallet = Self::new();
        wallet.sign_error = Arc::new(Mutex::new(Some(error)));
        wallet
    }

    pub fn pubkey(&self) -> Option<Pubkey> {
        self.signer.as_ref().map(|s| s.pubkey())
    }

    pub async fn get_sign_count(&self) -> usize {
        *self.sign_count.lock().await
    }
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletSigner for MockWallet {
    fn public_key(&self) -> Option<Pubkey> {
        self.pubkey()
    }

    async fn sign_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction, WalletError> {
        *self.sign_count.lock().await += 1;
        if let Some(err) = self.sign_error.lock().await.clone() {
            return Err(err);
        }
        match &self.signer {
            Some(signer) => signer.sign_transaction(transaction).await,
            None => Err(WalletError::not_connected()),
        }
    }
}

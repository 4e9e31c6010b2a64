//! Smart transaction submission
//!
//! One call to [`SmartSubmitter::send`] walks
//! `EstimatingBudget -> Assembling -> Signing -> Submitting -> Confirming`
//! strictly in order and makes at most one submission. Any failure ends
//! the send with a single classified [`SendError`]; nothing is retried.

use serde::{Deserialize, Serialize};
use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount, commitment_config::CommitmentLevel,
    instruction::Instruction, pubkey::Pubkey, signature::Signature,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};

use crate::metrics::{metrics, Timer};
use crate::observability::{send_span, CorrelationId};
use crate::rpc::{ChainClient, ConfirmationStrategy, LatestBlockhash, SendConfig};
use crate::tx_builder::assembler::{assemble, resolve_lookup_tables};
use crate::tx_builder::budget::{resolve_compute_unit_limit, BudgetRequest};
use crate::tx_builder::errors::{SendError, SendStage};
use crate::tx_builder::instructions::{validate_caller_instructions, MAX_COMPUTE_UNIT_LIMIT};
use crate::tx_builder::logs::error_message_from_logs;
use crate::tx_builder::signing::{classify_signing_error, signing_failure_message};
use crate::wallet::WalletSigner;

pub const DEFAULT_PRIORITY_FEE: u64 = 50_000;
pub const DEFAULT_COMPUTE_UNIT_LIMIT_MARGIN: f64 = 1.1;

/// Per-send options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SendOptions {
    /// Commitment to wait for after submission; `None` skips confirmation
    pub confirmation: Option<CommitmentLevel>,
    #[serde(skip)]
    pub lookup_tables: Vec<Pubkey>,
    /// Micro-lamports per compute unit; zero omits the price directive
    pub priority_fee: u64,
    pub compute_unit_limit_margin: f64,
    /// Explicit limit, skips simulation. Zero counts as not supplied.
    pub compute_units: Option<u32>,
    pub blockhash_commitment: CommitmentLevel,
    /// Diagnostic tag carried on the send span and simulation logs
    pub label: Option<String>,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            confirmation: Some(CommitmentLevel::Processed),
            lookup_tables: Vec::new(),
            priority_fee: DEFAULT_PRIORITY_FEE,
            compute_unit_limit_margin: DEFAULT_COMPUTE_UNIT_LIMIT_MARGIN,
            compute_units: None,
            blockhash_commitment: CommitmentLevel::Processed,
            label: None,
        }
    }
}

impl SendOptions {
    pub fn validate(&self) -> Result<(), SendError> {
        let margin = self.compute_unit_limit_margin;
        if !margin.is_finite() || margin < 1.0 {
            return Err(SendError::invalid_request(format!(
                "compute_unit_limit_margin must be a finite number >= 1.0, got {}",
                margin
            )));
        }
        if let Some(units) = self.explicit_compute_units() {
            if units > MAX_COMPUTE_UNIT_LIMIT {
                return Err(SendError::invalid_request(format!(
                    "compute_units must be at most {}, got {}",
                    MAX_COMPUTE_UNIT_LIMIT, units
                )));
            }
        }
        Ok(())
    }

    /// Caller limit, if one was given and is non-zero
    pub fn explicit_compute_units(&self) -> Option<u32> {
        self.compute_units.filter(|units| *units > 0)
    }
}

/// Everything one send needs once the budget is known. Owned by a single
/// send and dropped when it ends.
#[derive(Debug, Clone)]
pub struct TransactionPlan {
    pub payer: Pubkey,
    pub instructions: Vec<Instruction>,
    pub compute_unit_limit: u32,
    pub priority_fee: u64,
    pub blockhash: LatestBlockhash,
    pub lookup_tables: Vec<AddressLookupTableAccount>,
}

/// Estimate, assemble, sign, submit and confirm.
///
/// Holds no mutable state; concurrent sends are independent and are not
/// de-duplicated.
pub struct SmartSubmitter<C: ?Sized, W: ?Sized> {
    client: Arc<C>,
    wallet: Arc<W>,
}

impl<C, W> SmartSubmitter<C, W>
where
    C: ChainClient + ?Sized,
    W: WalletSigner + ?Sized,
{
    pub fn new(client: Arc<C>, wallet: Arc<W>) -> Self {
        Self { client, wallet }
    }

    pub async fn send(
        &self,
        instructions: &[Instruction],
        options: &SendOptions,
    ) -> Result<Signature, SendError> {
        let correlation_id = CorrelationId::new();
        let span = send_span(&correlation_id, options.label.as_deref());
        let timer = Timer::new();
        metrics().sends_total.inc();

        let result = self.run(instructions, options).instrument(span.clone()).await;

        let _entered = span.enter();
        match &result {
            Ok(signature) => {
                metrics().sends_succeeded.inc();
                info!(%signature, latency_ms = timer.elapsed_ms() as u64, "Send finished");
            }
            Err(e) => {
                metrics().record_failure(e.category());
                error!(
                    stage = %e.stage(),
                    kind = e.category(),
                    outcome_known = e.outcome_is_known(),
                    error = %e,
                    "Send failed"
                );
            }
        }
        timer.observe_ms(&metrics().send_latency_ms);
        result
    }

    async fn run(
        &self,
        instructions: &[Instruction],
        options: &SendOptions,
    ) -> Result<Signature, SendError> {
        let payer = self.wallet.public_key().ok_or_else(SendError::not_connected)?;
        options.validate()?;
        validate_caller_instructions(instructions)?;

        let lookup_tables = resolve_lookup_tables(self.client.as_ref(), &options.lookup_tables).await;

        debug!(stage = %SendStage::EstimatingBudget, "Stage");
        let request = BudgetRequest {
            payer: &payer,
            instructions,
            priority_fee: options.priority_fee,
            lookup_tables: &lookup_tables,
            margin: options.compute_unit_limit_margin,
            blockhash_commitment: options.blockhash_commitment,
            label: options.label.as_deref(),
        };
        let compute_unit_limit =
            resolve_compute_unit_limit(self.client.as_ref(), options.explicit_compute_units(), &request).await?;

        debug!(stage = %SendStage::Assembling, compute_unit_limit, "Stage");
        let blockhash = self
            .client
            .get_latest_blockhash(options.blockhash_commitment)
            .await
            .map_err(|e| SendError::BlockhashUnavailable(e.to_string()))?;
        let plan = TransactionPlan {
            payer,
            instructions: instructions.to_vec(),
            compute_unit_limit,
            priority_fee: options.priority_fee,
            blockhash,
            lookup_tables,
        };
        let unsigned = assemble(
            &plan.payer,
            plan.blockhash.blockhash,
            &plan.instructions,
            plan.compute_unit_limit,
            plan.priority_fee,
            &plan.lookup_tables,
        )?;

        debug!(stage = %SendStage::Signing, "Stage");
        let signed = self.wallet.sign_transaction(unsigned).await.map_err(|e| {
            let kind = classify_signing_error(&e.name, &e.message);
            warn!(name = %e.name, message = %e.message, ?kind, "Wallet failed to sign");
            SendError::signing(kind, signing_failure_message(kind))
        })?;

        debug!(stage = %SendStage::Submitting, "Stage");
        let signature = self
            .client
            .send_transaction(
                &signed,
                SendConfig {
                    skip_preflight: true,
                    preflight_commitment: options.blockhash_commitment,
                },
            )
            .await
            .map_err(|e| {
                let logs = e.logs().to_vec();
                SendError::SubmissionFailed {
                    message: error_message_from_logs(&logs, &e.message()),
                    logs,
                }
            })?;
        info!(%signature, "Transaction submitted");

        let Some(commitment) = options.confirmation else {
            return Ok(signature);
        };

        debug!(stage = %SendStage::Confirming, ?commitment, "Stage");
        self.client
            .confirm_transaction(
                ConfirmationStrategy {
                    signature,
                    blockhash: plan.blockhash.blockhash,
                    last_valid_block_height: plan.blockhash.last_valid_block_height,
                },
                commitment,
            )
            .await
            .map_err(|e| SendError::ConfirmationFailed {
                signature: signature.to_string(),
                message: e.message(),
            })?;

        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = SendOptions::default();
        assert_eq!(opts.confirmation, Some(CommitmentLevel::Processed));
        assert_eq!(opts.priority_fee, 50_000);
        assert_eq!(opts.compute_unit_limit_margin, 1.1);
        assert_eq!(opts.blockhash_commitment, CommitmentLevel::Processed);
        assert!(opts.lookup_tables.is_empty());
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_options_validation() {
        let bad_margin = SendOptions {
            compute_unit_limit_margin: 0.9,
            ..SendOptions::default()
        };
        assert!(matches!(bad_margin.validate(), Err(SendError::InvalidRequest(_))));

        let nan = SendOptions {
            compute_unit_limit_margin: f64::NAN,
            ..SendOptions::default()
        };
        assert!(nan.validate().is_err());

        let too_many_units = SendOptions {
            compute_units: Some(MAX_COMPUTE_UNIT_LIMIT + 1),
            ..SendOptions::default()
        };
        assert!(too_many_units.validate().is_err());

        let huge_margin = SendOptions {
            compute_unit_limit_margin: 1e33,
            ..SendOptions::default()
        };
        assert!(huge_margin.validate().is_ok());
    }

    #[test]
    fn test_zero_compute_units_means_not_supplied() {
        let zero = SendOptions {
            compute_units: Some(0),
            ..SendOptions::default()
        };
        assert!(zero.validate().is_ok());
        assert_eq!(zero.explicit_compute_units(), None);

        let explicit = SendOptions {
            compute_units: Some(90_000),
            ..SendOptions::default()
        };
        assert_eq!(explicit.explicit_compute_units(), Some(90_000));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let opts: SendOptions = toml::from_str(
            r#"
            priority_fee = 0
            confirmation = "confirmed"
            "#,
        )
        .unwrap();
        assert_eq!(opts.priority_fee, 0);
        assert_eq!(opts.confirmation, Some(CommitmentLevel::Confirmed));
        assert_eq!(opts.compute_unit_limit_margin, 1.1);
    }
}

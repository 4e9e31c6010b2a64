//! Smart transaction submission pipeline
//!
//! - **instructions**: budget directive planning and caller validation
//! - **assembler**: lookup table resolution and v0 compilation
//! - **budget**: simulation-backed compute unit estimation
//! - **logs**: human-readable messages from program logs
//! - **signing**: wallet failure classification
//! - **submitter**: the end-to-end [`SmartSubmitter`]
//! - **errors**: the single error type a send can end with
//!
//! ```rust,no_run
//! use launchpad_contributor::tx_builder::{SendOptions, SmartSubmitter};
//! # use launchpad_contributor::rpc::RpcChainClient;
//! # use launchpad_contributor::wallet::KeypairWallet;
//! # use std::sync::Arc;
//! # async fn example(
//! #     client: Arc<RpcChainClient>,
//! #     wallet: Arc<KeypairWallet>,
//! #     ixs: Vec<solana_sdk::instruction::Instruction>,
//! # ) -> Result<(), launchpad_contributor::tx_builder::SendError> {
//! let submitter = SmartSubmitter::new(client, wallet);
//! let signature = submitter.send(&ixs, &SendOptions::default()).await?;
//! # let _ = signature;
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod budget;
pub mod errors;
pub mod instructions;
pub mod logs;
pub mod signing;
pub mod submitter;

pub use assembler::{assemble, resolve_lookup_tables};
pub use budget::{apply_margin, estimate_compute_unit_limit, resolve_compute_unit_limit, BudgetRequest};
pub use errors::{SendError, SendStage, SigningFailure};
pub use instructions::{
    plan_instructions, sanity_check_ix_order, validate_caller_instructions, InstructionPlan,
    MAX_COMPUTE_UNIT_LIMIT,
};
pub use logs::{error_message_from_logs, parse_anchor_error, AnchorErrorLog};
pub use signing::{classify_signing_error, signing_failure_message};
pub use submitter::{SendOptions, SmartSubmitter, TransactionPlan};

//! Error taxonomy of the submission pipeline
//!
//! A failed send surfaces exactly one [`SendError`]. Every variant is terminal:
//! nothing in the pipeline retries, so the caller decides what happens next.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Pipeline stage a send was in when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStage {
    EstimatingBudget,
    Assembling,
    Signing,
    Submitting,
    Confirming,
}

impl SendStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EstimatingBudget => "estimating_budget",
            Self::Assembling => "assembling",
            Self::Signing => "signing",
            Self::Submitting => "submitting",
            Self::Confirming => "confirming",
        }
    }
}

impl fmt::Display for SendStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort classification of a signer failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningFailure {
    NotConnected,
    UserRejected,
    SignerMismatch,
    Generic,
}

impl fmt::Display for SigningFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotConnected => "wallet not connected",
            Self::UserRejected => "rejected by user",
            Self::SignerMismatch => "signer mismatch",
            Self::Generic => "signing failed",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SendError {
    /// The draft transaction would revert
    #[error("Simulation failed: {message}")]
    SimulationFailed { message: String, logs: Vec<String> },

    /// Simulation ran but reported no consumed compute units
    #[error("Simulation inconclusive: no compute units consumed")]
    SimulationInconclusive { logs: Vec<String> },

    #[error("Signing failed ({kind}): {message}")]
    SigningFailed { kind: SigningFailure, message: String },

    /// Node or program rejected the signed transaction
    #[error("Submission failed: {message}")]
    SubmissionFailed { message: String, logs: Vec<String> },

    /// Commitment not reached before expiry. The transaction may still land.
    #[error("Confirmation failed for {signature}: {message}")]
    ConfirmationFailed { signature: String, message: String },

    #[error("Blockhash unavailable: {0}")]
    BlockhashUnavailable(String),

    #[error("Assembly failed: {0}")]
    AssemblyFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SendError {
    pub fn stage(&self) -> SendStage {
        match self {
            Self::SimulationFailed { .. }
            | Self::SimulationInconclusive { .. }
            | Self::BlockhashUnavailable(_) => SendStage::EstimatingBudget,
            Self::AssemblyFailed(_) | Self::InvalidRequest(_) => SendStage::Assembling,
            Self::SigningFailed { .. } => SendStage::Signing,
            Self::SubmissionFailed { .. } => SendStage::Submitting,
            Self::ConfirmationFailed { .. } => SendStage::Confirming,
        }
    }

    /// Label for metrics and logs
    pub fn category(&self) -> &'static str {
        match self {
            Self::SimulationFailed { .. } => "simulation_failed",
            Self::SimulationInconclusive { .. } => "simulation_inconclusive",
            Self::SigningFailed { .. } => "signing_failed",
            Self::SubmissionFailed { .. } => "submission_failed",
            Self::ConfirmationFailed { .. } => "confirmation_failed",
            Self::BlockhashUnavailable(_) => "blockhash",
            Self::AssemblyFailed(_) => "assembly",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }

    /// False when funds may or may not have moved.
    ///
    /// Only a confirmation failure leaves the outcome open; callers must
    /// check the signature later rather than assume it failed.
    pub fn outcome_is_known(&self) -> bool {
        !matches!(self, Self::ConfirmationFailed { .. })
    }

    /// Program logs carried by the error, if any.
    pub fn logs(&self) -> &[String] {
        match self {
            Self::SimulationFailed { logs, .. }
            | Self::SimulationInconclusive { logs }
            | Self::SubmissionFailed { logs, .. } => logs,
            _ => &[],
        }
    }
}

// Convenience constructors
impl SendError {
    pub fn signing(kind: SigningFailure, message: impl Into<String>) -> Self {
        Self::SigningFailed {
            kind,
            message: message.into(),
        }
    }

    pub fn not_connected() -> Self {
        Self::signing(SigningFailure::NotConnected, "Wallet not connected")
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest(reason.into())
    }

    pub fn assembly_failed(reason: impl Into<String>) -> Self {
        Self::AssemblyFailed(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SendError::SimulationFailed {
            message: "Insufficient balance".to_string(),
            logs: vec![],
        };
        assert_eq!(err.to_string(), "Simulation failed: Insufficient balance");

        let err = SendError::signing(SigningFailure::UserRejected, "User rejected the request.");
        assert_eq!(
            err.to_string(),
            "Signing failed (rejected by user): User rejected the request."
        );
    }

    #[test]
    fn test_stages() {
        assert_eq!(
            SendError::SimulationInconclusive { logs: vec![] }.stage(),
            SendStage::EstimatingBudget
        );
        assert_eq!(SendError::not_connected().stage(), SendStage::Signing);
        assert_eq!(
            SendError::SubmissionFailed {
                message: "x".to_string(),
                logs: vec![]
            }
            .stage(),
            SendStage::Submitting
        );
        assert_eq!(SendStage::EstimatingBudget.to_string(), "estimating_budget");
    }

    #[test]
    fn test_only_confirmation_failure_is_ambiguous() {
        let ambiguous = SendError::ConfirmationFailed {
            signature: "sig".to_string(),
            message: "block height exceeded".to_string(),
        };
        assert!(!ambiguous.outcome_is_known());
        assert_eq!(ambiguous.category(), "confirmation_failed");

        assert!(SendError::not_connected().outcome_is_known());
        assert!(SendError::BlockhashUnavailable("down".to_string()).outcome_is_known());
    }

    #[test]
    fn test_logs_accessor() {
        let err = SendError::SubmissionFailed {
            message: "m".to_string(),
            logs: vec!["Program log: a".to_string()],
        };
        assert_eq!(err.logs().len(), 1);
        assert!(SendError::assembly_failed("bad").logs().is_empty());
    }
}

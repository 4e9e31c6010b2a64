//! Signer error classification
//!
//! Signers report failures as free text. This mapping is the only place
//! that text is interpreted.

use super::errors::SigningFailure;

/// Classify a signer failure from its error name and message.
pub fn classify_signing_error(name: &str, message: &str) -> SigningFailure {
    let lower = format!("{} {}", name, message).to_lowercase();
    if lower.contains("not connected") {
        SigningFailure::NotConnected
    } else if lower.contains("reject") {
        SigningFailure::UserRejected
    } else if name.contains("WalletSignTransactionError")
        || message.contains("Unexpected error")
        || lower.contains("mismatch")
    {
        SigningFailure::SignerMismatch
    } else {
        SigningFailure::Generic
    }
}

/// Message shown for a classified signer failure.
pub fn signing_failure_message(kind: SigningFailure) -> &'static str {
    match kind {
        SigningFailure::NotConnected => "Wallet not connected",
        SigningFailure::UserRejected => "User rejected the request",
        SigningFailure::SignerMismatch => "Wallet signer mismatch: wrong wallet connected",
        SigningFailure::Generic => "Wallet failed to sign",
    }
}

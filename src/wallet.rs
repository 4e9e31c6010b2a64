//! Wallet signer seam and a file-backed keypair wallet

use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::VersionedTransaction,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Error reported by a signer.
///
/// Signers expose no structured taxonomy, only an error name and message;
/// the submission pipeline classifies them from that text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct WalletError {
    pub name: String,
    pub message: String,
}

impl WalletError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn not_connected() -> Self {
        Self::new("WalletNotConnectedError", "Wallet not connected")
    }
}

/// External signer collaborator.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// `None` while no wallet is connected.
    fn public_key(&self) -> Option<Pubkey>;

    async fn sign_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction, WalletError>;
}

/// Signer backed by a local keypair file.
pub struct KeypairWallet {
    keypair: Arc<Keypair>,
}

impl KeypairWallet {
    /// Load a keypair from a JSON array or raw 64-byte file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let keypair_bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read keypair file: {}", path.display()))?;

        let bytes: Vec<u8> = if keypair_bytes.len() == 64 {
            keypair_bytes
        } else {
            serde_json::from_slice(&keypair_bytes).context("Failed to parse keypair JSON")?
        };
        if bytes.len() != 64 {
            anyhow::bail!("Invalid keypair length: expected 64 bytes, got {}", bytes.len());
        }
        if bytes.iter().all(|&b| b == 0) {
            anyhow::bail!("Invalid keypair: all-zero key rejected");
        }
        let keypair = Keypair::try_from(bytes.as_slice()).context("Invalid keypair bytes")?;
        Ok(Self::from_keypair(keypair))
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

#[async_trait]
impl WalletSigner for KeypairWallet {
    fn public_key(&self) -> Option<Pubkey> {
        Some(self.keypair.pubkey())
    }

    async fn sign_transaction(
        &self,
        mut transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction, WalletError> {
        let own = self.keypair.pubkey();
        let required = usize::from(transaction.message.header().num_required_signatures);
        let position = transaction
            .message
            .static_account_keys()
            .iter()
            .take(required)
            .position(|key| *key == own)
            .ok_or_else(|| {
                WalletError::new(
                    "SignerMismatchError",
                    format!("Signer mismatch: {} is not a required signer", own),
                )
            })?;

        if transaction.signatures.len() < required {
            transaction.signatures.resize(required, Signature::default());
        }
        let payload = transaction.message.serialize();
        transaction.signatures[position] = self
            .keypair
            .try_sign_message(&payload)
            .map_err(|e| WalletError::new("WalletSignTransactionError", e.to_string()))?;
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{
        hash::Hash,
        instruction::{AccountMeta, Instruction},
        message::{v0, VersionedMessage},
    };
    use std::io::Write;

    fn unsigned(payer: &Pubkey) -> VersionedTransaction {
        let ix = Instruction::new_with_bytes(
            Pubkey::new_unique(),
            &[1, 2, 3],
            vec![AccountMeta::new(*payer, true)],
        );
        let message = v0::Message::try_compile(payer, &[ix], &[], Hash::new_unique()).unwrap();
        VersionedTransaction {
            signatures: vec![Signature::default()],
            message: VersionedMessage::V0(message),
        }
    }

    #[tokio::test]
    async fn test_signs_as_payer() {
        let wallet = KeypairWallet::from_keypair(Keypair::new());
        let signed = wallet.sign_transaction(unsigned(&wallet.pubkey())).await.unwrap();
        assert_ne!(signed.signatures[0], Signature::default());
        assert!(signed.verify_with_results().iter().all(|ok| *ok));
    }

    #[tokio::test]
    async fn test_foreign_payer_is_mismatch() {
        let wallet = KeypairWallet::from_keypair(Keypair::new());
        let err = wallet
            .sign_transaction(unsigned(&Pubkey::new_unique()))
            .await
            .unwrap_err();
        assert!(err.message.to_lowercase().contains("mismatch"));
    }

    #[test]
    fn test_from_file_json_and_raw() {
        let keypair = Keypair::new();
        let bytes = keypair.to_bytes();

        let mut json_file = tempfile::NamedTempFile::new().unwrap();
        write!(json_file, "{}", serde_json::to_string(&bytes.to_vec()).unwrap()).unwrap();
        let wallet = KeypairWallet::from_file(json_file.path()).unwrap();
        assert_eq!(wallet.pubkey(), keypair.pubkey());

        let mut raw_file = tempfile::NamedTempFile::new().unwrap();
        raw_file.write_all(&bytes).unwrap();
        assert_eq!(KeypairWallet::from_file(raw_file.path()).unwrap().pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_from_file_rejects_bad_keys() {
        let mut zero = tempfile::NamedTempFile::new().unwrap();
        zero.write_all(&[0u8; 64]).unwrap();
        assert!(KeypairWallet::from_file(zero.path()).is_err());

        let mut short = tempfile::NamedTempFile::new().unwrap();
        write!(short, "[1,2,3]").unwrap();
        assert!(KeypairWallet::from_file(short.path()).is_err());

        assert!(KeypairWallet::from_file("/nonexistent/keypair.json").is_err());
    }
}

//! Preconditions for funding and claiming
//!
//! Checks run before any instruction is built: a connected wallet, a
//! positive amount, and a launch in the right lifecycle state.

use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use thiserror::Error;

use super::normalize::CampaignRecord;
use super::state::LaunchState;

/// Decimals of the default quote asset.
pub const DEFAULT_QUOTE_DECIMALS: u8 = 6;

/// Seed prefix of a funder's record under a launch.
pub const FUNDING_RECORD_SEED: &[u8] = b"funding_record";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContributionError {
    #[error("Connect a wallet first")]
    WalletNotConnected,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Launch is {0}, not accepting contributions")]
    NotContributable(LaunchState),

    #[error("Nothing to claim")]
    NothingToClaim,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Convert a user-entered decimal amount into raw units.
///
/// Exact decimal arithmetic; digits past `decimals` are rounded half-up at
/// the last kept digit. Zero, negative and malformed input are rejected.
pub fn ui_amount_to_raw(text: &str, decimals: u8) -> Result<u64, ContributionError> {
    let invalid = || ContributionError::InvalidAmount(text.to_string());
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(invalid());
    }
    let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let decimals = usize::from(decimals);
    let scale = 10u128.checked_pow(decimals as u32).ok_or_else(invalid)?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| invalid())?
    }
    .checked_mul(scale)
    .ok_or_else(invalid)?;

    let kept: String = frac.chars().take(decimals).collect();
    let mut frac_units = if kept.is_empty() {
        0
    } else {
        format!("{:0<width$}", kept, width = decimals)
            .parse::<u128>()
            .map_err(|_| invalid())?
    };
    if frac.chars().nth(decimals).is_some_and(|d| d >= '5') {
        frac_units += 1;
    }

    let raw = whole_units.checked_add(frac_units).ok_or_else(invalid)?;
    if raw == 0 {
        return Err(invalid());
    }
    u64::try_from(raw).map_err(|_| invalid())
}

pub fn ensure_can_contribute(
    record: &CampaignRecord,
    wallet: Option<&Pubkey>,
    raw_amount: u64,
) -> Result<(), ContributionError> {
    if wallet.is_none() {
        return Err(ContributionError::WalletNotConnected);
    }
    if raw_amount == 0 {
        return Err(ContributionError::InvalidAmount("0".to_string()));
    }
    if !record.can_contribute {
        return Err(ContributionError::NotContributable(record.state));
    }
    launch_address(record)?;
    Ok(())
}

/// Claims need a completed launch and a non-zero committed amount.
pub fn ensure_can_claim(
    record: &CampaignRecord,
    wallet: Option<&Pubkey>,
    committed: Option<&str>,
) -> Result<(), ContributionError> {
    if wallet.is_none() {
        return Err(ContributionError::WalletNotConnected);
    }
    if record.state != LaunchState::Completed {
        return Err(ContributionError::NothingToClaim);
    }
    let committed = committed
        .and_then(|c| c.trim().parse::<u128>().ok())
        .unwrap_or(0);
    if committed == 0 {
        return Err(ContributionError::NothingToClaim);
    }
    launch_address(record)?;
    Ok(())
}

pub fn launch_address(record: &CampaignRecord) -> Result<Pubkey, ContributionError> {
    Pubkey::from_str(&record.address)
        .map_err(|_| ContributionError::InvalidAddress(record.address.clone()))
}

/// Address of `funder`'s funding record for `launch`.
pub fn funding_record_address(program_id: &Pubkey, launch: &Pubkey, funder: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[FUNDING_RECORD_SEED, launch.as_ref(), funder.as_ref()],
        program_id,
    )
    .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::normalize::normalize_at;
    use crate::launch::raw::LaunchAccountEntry;
    use crate::launch::state::LaunchVersion;
    use serde_json::json;

    fn record(state: &str) -> CampaignRecord {
        let address = Pubkey::new_unique().to_string();
        normalize_at(
            &LaunchAccountEntry::new(address, json!({ "state": { state: {} } })),
            LaunchVersion::V07,
            0,
        )
    }

    #[test]
    fn test_ui_amount_to_raw() {
        assert_eq!(ui_amount_to_raw("1", 6), Ok(1_000_000));
        assert_eq!(ui_amount_to_raw("12.5", 6), Ok(12_500_000));
        assert_eq!(ui_amount_to_raw(".25", 6), Ok(250_000));
        assert_eq!(ui_amount_to_raw("0.0000015", 6), Ok(2));
        assert_eq!(ui_amount_to_raw("0.0000014", 6), Ok(1));
        assert_eq!(ui_amount_to_raw("1.999", 0), Ok(2));
        // 0.1 + 0.2 style float drift cannot happen
        assert_eq!(ui_amount_to_raw("0.3", 6), Ok(300_000));
    }

    #[test]
    fn test_ui_amount_to_raw_rejects() {
        for bad in ["", "0", "0.0000004", "-1", "abc", "1.2.3", ".", "18446744073709.551616"] {
            assert!(ui_amount_to_raw(bad, 6).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_contribute_requires_live_and_wallet() {
        let wallet = Pubkey::new_unique();
        assert_eq!(ensure_can_contribute(&record("live"), Some(&wallet), 10), Ok(()));
        assert_eq!(
            ensure_can_contribute(&record("live"), None, 10),
            Err(ContributionError::WalletNotConnected)
        );
        assert_eq!(
            ensure_can_contribute(&record("closed"), Some(&wallet), 10),
            Err(ContributionError::NotContributable(LaunchState::Closed))
        );
        assert!(ensure_can_contribute(&record("live"), Some(&wallet), 0).is_err());
    }

    #[test]
    fn test_claim_requires_completed_and_commitment() {
        let wallet = Pubkey::new_unique();
        assert_eq!(ensure_can_claim(&record("completed"), Some(&wallet), Some("5")), Ok(()));
        assert_eq!(
            ensure_can_claim(&record("completed"), Some(&wallet), Some("0")),
            Err(ContributionError::NothingToClaim)
        );
        assert_eq!(
            ensure_can_claim(&record("completed"), Some(&wallet), None),
            Err(ContributionError::NothingToClaim)
        );
        assert_eq!(
            ensure_can_claim(&record("live"), Some(&wallet), Some("5")),
            Err(ContributionError::NothingToClaim)
        );
    }

    #[test]
    fn test_funding_record_address_is_deterministic() {
        let program = Pubkey::new_unique();
        let launch = Pubkey::new_unique();
        let funder = Pubkey::new_unique();
        let a = funding_record_address(&program, &launch, &funder);
        assert_eq!(a, funding_record_address(&program, &launch, &funder));
        assert_ne!(a, funding_record_address(&program, &launch, &Pubkey::new_unique()));
    }
}

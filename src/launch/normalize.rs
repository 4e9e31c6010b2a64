//! Launch account normalization
//!
//! Turns a version-specific raw account into a [`CampaignRecord`], the
//! canonical snapshot the catalogue and the contribution checks work from.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use super::amount::is_likely_test;
use super::raw::{stringify_snapshot, LaunchAccountEntry, RawLaunch};
use super::state::{LaunchState, LaunchVersion};

/// Display data joined onto a record after metadata enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMeta {
    pub token_name: String,
    pub token_symbol: String,
    pub logo_uri: String,
    pub quote_symbol: String,
    pub quote_logo_uri: String,
}

/// Immutable snapshot of one launch account.
///
/// Amounts are decimal strings in the smallest quote unit. A manual refresh
/// replaces the whole record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
    pub address: String,
    /// Empty when unknown
    pub base_mint: String,
    /// Empty when unknown
    pub quote_mint: String,
    pub version: LaunchVersion,
    pub state: LaunchState,
    pub total_committed: Option<String>,
    /// Minimum raise, else final raise
    pub goal_amount: Option<String>,
    /// Final raise
    pub accepted_amount: Option<String>,
    pub is_likely_test: bool,
    pub can_contribute: bool,
    /// `None` means unknown, `Some(0)` means ended.
    pub seconds_remaining: Option<u64>,
    /// Name/symbol stored on the account itself, used when metadata is empty
    pub raw_token_name: Option<String>,
    pub raw_token_symbol: Option<String>,
    pub display: DisplayMeta,
    pub raw_account: Value,
}

impl CampaignRecord {
    /// Name to show: enriched name, else the account's own, else empty.
    pub fn display_name(&self) -> &str {
        if !self.display.token_name.is_empty() {
            return &self.display.token_name;
        }
        self.raw_token_name.as_deref().unwrap_or("")
    }

    pub fn display_symbol(&self) -> &str {
        if !self.display.token_symbol.is_empty() {
            return &self.display.token_symbol;
        }
        self.raw_token_symbol.as_deref().unwrap_or("")
    }
}

/// Normalize against the current wall clock.
pub fn normalize(entry: &LaunchAccountEntry, version: LaunchVersion) -> CampaignRecord {
    normalize_at(entry, version, Utc::now().timestamp())
}

/// Normalize with an explicit `now` (unix seconds).
pub fn normalize_at(entry: &LaunchAccountEntry, version: LaunchVersion, now: i64) -> CampaignRecord {
    let raw = RawLaunch::from_value(version, &entry.account);
    let fields = raw.fields();

    let goal_amount = fields.minimum_raise.clone().or_else(|| fields.final_raise.clone());
    let seconds_remaining = if fields.state == LaunchState::Live {
        seconds_remaining(fields.started_at, fields.duration_secs, now)
    } else {
        None
    };

    CampaignRecord {
        address: entry.address.clone(),
        base_mint: fields.base_mint,
        quote_mint: fields.quote_mint,
        version: raw.version(),
        state: fields.state,
        is_likely_test: is_likely_test(goal_amount.as_deref(), fields.total_committed.as_deref()),
        can_contribute: fields.state.accepts_contributions(),
        total_committed: fields.total_committed,
        goal_amount,
        accepted_amount: fields.final_raise,
        seconds_remaining,
        raw_token_name: fields.token_name,
        raw_token_symbol: fields.token_symbol,
        display: DisplayMeta::default(),
        raw_account: stringify_snapshot(&entry.account),
    }
}

/// Zero start or zero duration counts as not set.
fn seconds_remaining(started_at: Option<i64>, duration: Option<i64>, now: i64) -> Option<u64> {
    let start = started_at.filter(|v| *v != 0)?;
    let duration = duration.filter(|v| *v != 0)?;
    let end = start.saturating_add(duration);
    Some(u64::try_from(end.saturating_sub(now)).unwrap_or(0))
}

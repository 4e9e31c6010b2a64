//! Launch catalogue
//!
//! Loads every protocol version concurrently, keeps the newest version of
//! each launch, joins display metadata and offers the filter/sort views the
//! CLI renders.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::amount::parse_raw_amount;
use super::normalize::{normalize_at, CampaignRecord, DisplayMeta};
use super::raw::LaunchAccountEntry;
use super::source::{AccountSource, SourceError};
use super::state::LaunchState;
use crate::metadata::{enrich_metadata, lookup_metadata, MetadataSource, TokenMeta};

/// Quote symbol shown when the quote mint has no metadata.
pub const DEFAULT_QUOTE_SYMBOL: &str = "USDC";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContributeFilter {
    #[default]
    All,
    Contributable,
    NonContributable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Goal,
    #[default]
    Raised,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    /// `None` shows every state
    pub state: Option<LaunchState>,
    pub contribute: ContributeFilter,
    pub include_tests: bool,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            state: None,
            contribute: ContributeFilter::All,
            include_tests: true,
        }
    }
}

impl CatalogFilter {
    pub fn matches(&self, record: &CampaignRecord) -> bool {
        if self.state.is_some_and(|s| s != record.state) {
            return false;
        }
        if !self.include_tests && record.is_likely_test {
            return false;
        }
        match self.contribute {
            ContributeFilter::All => true,
            ContributeFilter::Contributable => record.can_contribute,
            ContributeFilter::NonContributable => !record.can_contribute,
        }
    }
}

/// Result of re-reading a single launch.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Updated(CampaignRecord),
    /// Account no longer exists; the previous record stays as it was
    Vanished,
}

/// Deduplicated, enriched set of launches.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<CampaignRecord>,
}

impl Catalog {
    pub fn new(records: Vec<CampaignRecord>) -> Self {
        Self { records }
    }

    /// Fetch all sources concurrently and build the catalogue.
    ///
    /// A failing source contributes nothing. Metadata is resolved through
    /// `endpoint` and never fails the load.
    pub async fn load<M>(
        sources: &[Arc<dyn AccountSource>],
        metadata: &M,
        endpoint: Option<&str>,
        now: i64,
    ) -> Self
    where
        M: MetadataSource + ?Sized,
    {
        let listings = join_all(sources.iter().map(|source| async move {
            let version = source.version();
            match source.list_all().await {
                Ok(entries) => (version, entries),
                Err(e) => {
                    warn!(%version, error = %e, "Launch source failed, treating as empty");
                    (version, Vec::<LaunchAccountEntry>::new())
                }
            }
        }))
        .await;

        let normalized: Vec<CampaignRecord> = listings
            .iter()
            .flat_map(|(version, entries)| {
                entries.iter().map(move |entry| normalize_at(entry, *version, now))
            })
            .collect();
        let mut records = dedup_by_version(normalized);

        let mints: Vec<String> = records
            .iter()
            .flat_map(|r| [r.base_mint.clone(), r.quote_mint.clone()])
            .collect();
        let meta = enrich_metadata(metadata, endpoint, &mints).await;
        for record in &mut records {
            apply_display(record, &meta);
        }

        info!(count = records.len(), "Launch catalogue loaded");
        Self { records }
    }

    pub fn records(&self) -> &[CampaignRecord] {
        &self.records
    }

    pub fn get(&self, address: &str) -> Option<&CampaignRecord> {
        self.records.iter().find(|r| r.address == address)
    }

    /// Launches currently open for contribution, ignoring any filter.
    pub fn contributable_count(&self) -> usize {
        self.records.iter().filter(|r| r.can_contribute).count()
    }

    /// Filtered and sorted view. Ties keep load order.
    pub fn view(
        &self,
        filter: &CatalogFilter,
        field: SortField,
        direction: SortDirection,
    ) -> Vec<&CampaignRecord> {
        let mut rows: Vec<&CampaignRecord> =
            self.records.iter().filter(|r| filter.matches(r)).collect();
        rows.sort_by(|a, b| {
            let ord = sort_key(a, field).cmp(&sort_key(b, field));
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
        rows
    }

    /// Swap in a refreshed record. Returns false when the address is unknown.
    pub fn replace(&mut self, record: CampaignRecord) -> bool {
        match self.records.iter_mut().find(|r| r.address == record.address) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }
}

/// Absent or unreadable amounts sort as zero.
fn sort_key(record: &CampaignRecord, field: SortField) -> i128 {
    let raw = match field {
        SortField::Goal => record.goal_amount.as_deref(),
        SortField::Raised => record.total_committed.as_deref(),
    };
    raw.and_then(parse_raw_amount).unwrap_or(0)
}

/// Keep one record per address: the one with the highest version.
///
/// Output follows first appearance of each address.
pub fn dedup_by_version(records: Vec<CampaignRecord>) -> Vec<CampaignRecord> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut out: Vec<CampaignRecord> = Vec::with_capacity(records.len());
    for record in records {
        match index.get(&record.address) {
            Some(&i) => {
                if record.version.cmp(&out[i].version) == Ordering::Greater {
                    out[i] = record;
                }
            }
            None => {
                index.insert(record.address.clone(), out.len());
                out.push(record);
            }
        }
    }
    out
}

/// Join metadata onto a record's display fields.
///
/// Empty metadata falls back to the name/symbol stored on the account; the
/// quote symbol falls back to [`DEFAULT_QUOTE_SYMBOL`].
pub fn apply_display(record: &mut CampaignRecord, meta: &HashMap<String, TokenMeta>) {
    let empty = TokenMeta::empty();
    let base = meta.get(&record.base_mint).unwrap_or(&empty);
    let quote = meta.get(&record.quote_mint).unwrap_or(&empty);

    record.display = DisplayMeta {
        token_name: non_empty_or(&base.name, record.raw_token_name.as_deref()),
        token_symbol: non_empty_or(&base.symbol, record.raw_token_symbol.as_deref()),
        logo_uri: base.logo_uri.clone(),
        quote_symbol: non_empty_or(&quote.symbol, Some(DEFAULT_QUOTE_SYMBOL)),
        quote_logo_uri: quote.logo_uri.clone(),
    };
}

fn non_empty_or(value: &str, fallback: Option<&str>) -> String {
    if value.is_empty() {
        fallback.unwrap_or("").to_string()
    } else {
        value.to_string()
    }
}

/// Re-read one launch from its source and rebuild the whole record.
///
/// Display enrichment is carried over from the old record.
pub async fn refresh_record(
    source: &dyn AccountSource,
    record: &CampaignRecord,
    now: i64,
) -> Result<RefreshOutcome, SourceError> {
    let Some(account) = source.fetch(&record.address).await? else {
        warn!(address = %record.address, "Launch account vanished on refresh");
        return Ok(RefreshOutcome::Vanished);
    };
    let entry = LaunchAccountEntry::new(record.address.clone(), account);
    let mut fresh = normalize_at(&entry, source.version(), now);
    fresh.display = record.display.clone();
    Ok(RefreshOutcome::Updated(fresh))
}

/// Refresh one launch for a detail view.
///
/// Re-reads the account like [`refresh_record`], then resolves the base asset
/// on its own. A lookup that finds nothing keeps the previous display.
pub async fn refresh_detail<M>(
    source: &dyn AccountSource,
    metadata: &M,
    endpoint: Option<&str>,
    record: &CampaignRecord,
    now: i64,
) -> Result<RefreshOutcome, SourceError>
where
    M: MetadataSource + ?Sized,
{
    let mut fresh = match refresh_record(source, record, now).await? {
        RefreshOutcome::Updated(fresh) => fresh,
        RefreshOutcome::Vanished => return Ok(RefreshOutcome::Vanished),
    };
    let base = lookup_metadata(metadata, endpoint, &fresh.base_mint).await;
    if !base.is_empty() {
        let name = non_empty_or(&base.name, Some(fresh.display.token_name.as_str()));
        let symbol = non_empty_or(&base.symbol, Some(fresh.display.token_symbol.as_str()));
        let logo = non_empty_or(&base.logo_uri, Some(fresh.display.logo_uri.as_str()));
        fresh.display.token_name = name;
        fresh.display.token_symbol = symbol;
        fresh.display.logo_uri = logo;
    }
    Ok(RefreshOutcome::Updated(fresh))
}

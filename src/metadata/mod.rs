//! Token display metadata
//!
//! Enrichment never fails: every requested address gets an entry, and
//! anything that could not be resolved is [`TokenMeta::empty`].

pub mod das;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::{debug, warn};

pub use das::DasMetadataSource;

/// USDC mint on mainnet.
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

const USDC_LOGO: &str = "https://raw.githubusercontent.com/solana-labs/token-list/main/assets/mainnet/EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v/logo.png";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMeta {
    pub name: String,
    pub symbol: String,
    #[serde(rename = "logoURI")]
    pub logo_uri: String,
}

impl TokenMeta {
    /// Sentinel for "looked up, nothing known".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.symbol.is_empty() && self.logo_uri.is_empty()
    }
}

/// Static table consulted before any network lookup.
pub fn known_token(address: &str) -> Option<TokenMeta> {
    match address {
        USDC_MINT => Some(TokenMeta {
            name: "USD Coin".to_string(),
            symbol: "USDC".to_string(),
            logo_uri: USDC_LOGO.to_string(),
        }),
        _ => None,
    }
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Metadata request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Metadata service returned HTTP {0}")]
    Status(u16),

    #[error("Metadata service error: {0}")]
    Service(String),
}

/// External metadata lookup. The endpoint is always passed in by the caller.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Whether lookups can be served through `endpoint`.
    fn supports(&self, endpoint: &str) -> bool;

    /// One call for all `ids`; the result may be partial.
    async fn batch_lookup(
        &self,
        endpoint: &str,
        ids: &[String],
    ) -> Result<HashMap<String, TokenMeta>, MetadataError>;

    async fn lookup(&self, endpoint: &str, id: &str) -> Result<Option<TokenMeta>, MetadataError>;
}

/// Resolve display metadata for `addresses`.
///
/// Duplicates and empty strings are ignored. Known assets are answered
/// locally; the rest go out in a single batch call. Total or partial
/// failure of that call backfills [`TokenMeta::empty`].
pub async fn enrich_metadata<S>(
    source: &S,
    endpoint: Option<&str>,
    addresses: &[String],
) -> HashMap<String, TokenMeta>
where
    S: MetadataSource + ?Sized,
{
    let unique: BTreeSet<&str> = addresses
        .iter()
        .map(String::as_str)
        .filter(|a| !a.is_empty())
        .collect();

    let mut result = HashMap::with_capacity(unique.len());
    let mut to_fetch = Vec::new();
    for address in unique {
        match known_token(address) {
            Some(meta) => {
                result.insert(address.to_string(), meta);
            }
            None => to_fetch.push(address.to_string()),
        }
    }

    if to_fetch.is_empty() {
        return result;
    }

    match endpoint.filter(|e| source.supports(e)) {
        Some(endpoint) => match source.batch_lookup(endpoint, &to_fetch).await {
            Ok(mut fetched) => {
                debug!(
                    requested = to_fetch.len(),
                    returned = fetched.len(),
                    "Metadata batch resolved"
                );
                for address in &to_fetch {
                    let meta = fetched.remove(address).unwrap_or_default();
                    result.insert(address.clone(), meta);
                }
            }
            Err(e) => {
                warn!(error = %e, count = to_fetch.len(), "Metadata batch lookup failed, using empty entries");
                for address in to_fetch {
                    result.insert(address, TokenMeta::empty());
                }
            }
        },
        None => {
            debug!(count = to_fetch.len(), "No metadata endpoint available, using empty entries");
            for address in to_fetch {
                result.insert(address, TokenMeta::empty());
            }
        }
    }

    result
}

/// Resolve one asset. Never fails; unknown assets yield the empty sentinel.
pub async fn lookup_metadata<S>(source: &S, endpoint: Option<&str>, address: &str) -> TokenMeta
where
    S: MetadataSource + ?Sized,
{
    if let Some(meta) = known_token(address) {
        return meta;
    }
    let Some(endpoint) = endpoint.filter(|e| source.supports(e)) else {
        return TokenMeta::empty();
    };
    match source.lookup(endpoint, address).await {
        Ok(meta) => meta.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, %address, "Metadata lookup failed");
            TokenMeta::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        entries: HashMap<String, TokenMeta>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn new(entries: &[(&str, &str)], fail: bool) -> Self {
            Self {
                entries: entries
                    .iter()
                    .map(|(id, sym)| {
                        (
                            id.to_string(),
                            TokenMeta {
                                name: format!("{} token", sym),
                                symbol: sym.to_string(),
                                logo_uri: String::new(),
                            },
                        )
                    })
                    .collect(),
                fail,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MetadataSource for StaticSource {
        fn supports(&self, endpoint: &str) -> bool {
            endpoint.contains("helius")
        }

        async fn batch_lookup(
            &self,
            _endpoint: &str,
            ids: &[String],
        ) -> Result<HashMap<String, TokenMeta>, MetadataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MetadataError::Service("boom".to_string()));
            }
            Ok(ids
                .iter()
                .filter_map(|id| self.entries.get(id).map(|m| (id.clone(), m.clone())))
                .collect())
        }

        async fn lookup(&self, _endpoint: &str, id: &str) -> Result<Option<TokenMeta>, MetadataError> {
            Ok(self.entries.get(id).cloned())
        }
    }

    const HELIUS: Option<&str> = Some("https://mainnet.helius-rpc.com/?api-key=x");

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_every_address_gets_an_entry_on_partial_response() {
        let source = StaticSource::new(&[("MintA", "AAA")], false);
        let map = enrich_metadata(&source, HELIUS, &ids(&["MintA", "MintB", "MintA", ""])).await;
        assert_eq!(map.len(), 2);
        assert_eq!(map["MintA"].symbol, "AAA");
        assert_eq!(map["MintB"], TokenMeta::empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_total_failure_backfills_empty() {
        let source = StaticSource::new(&[("MintA", "AAA")], true);
        let map = enrich_metadata(&source, HELIUS, &ids(&["MintA", USDC_MINT])).await;
        assert_eq!(map["MintA"], TokenMeta::empty());
        assert_eq!(map[USDC_MINT].symbol, "USDC");
    }

    #[tokio::test]
    async fn test_known_assets_skip_the_network() {
        let source = StaticSource::new(&[], false);
        let map = enrich_metadata(&source, HELIUS, &ids(&[USDC_MINT])).await;
        assert_eq!(map[USDC_MINT].name, "USD Coin");
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_endpoint_degrades_without_calling() {
        let source = StaticSource::new(&[("MintA", "AAA")], false);
        let map = enrich_metadata(
            &source,
            Some("https://api.mainnet-beta.solana.com"),
            &ids(&["MintA"]),
        )
        .await;
        assert_eq!(map["MintA"], TokenMeta::empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        let none = enrich_metadata(&source, None, &ids(&["MintA"])).await;
        assert_eq!(none["MintA"], TokenMeta::empty());
    }

    #[tokio::test]
    async fn test_enrichment_is_idempotent() {
        let source = StaticSource::new(&[("MintA", "AAA"), ("MintC", "CCC")], false);
        let request = ids(&["MintC", "MintA", "MintB", USDC_MINT]);
        let first = enrich_metadata(&source, HELIUS, &request).await;
        let second = enrich_metadata(&source, HELIUS, &request).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_single_lookup() {
        let source = StaticSource::new(&[("MintA", "AAA")], false);
        assert_eq!(lookup_metadata(&source, HELIUS, "MintA").await.symbol, "AAA");
        assert_eq!(lookup_metadata(&source, HELIUS, "Missing").await, TokenMeta::empty());
        assert_eq!(lookup_metadata(&source, None, USDC_MINT).await.symbol, "USDC");
    }
}

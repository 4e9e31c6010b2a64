//! DAS (Digital Asset Standard) metadata source
//!
//! Speaks the `getAssetBatch` / `getAsset` JSON-RPC methods offered by
//! DAS-capable RPC providers.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::{MetadataError, MetadataSource, TokenMeta};

pub struct DasMetadataSource {
    http: Client,
    /// Endpoint substrings that identify a DAS-capable provider
    markers: Vec<String>,
}

impl DasMetadataSource {
    pub fn new(markers: Vec<String>, timeout: Duration) -> Result<Self, MetadataError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, markers })
    }

    async fn call(&self, endpoint: &str, payload: Value) -> Result<Value, MetadataError> {
        let resp = self.http.post(endpoint).json(&payload).send().await?;
        if !resp.status().is_success() {
            return Err(MetadataError::Status(resp.status().as_u16()));
        }
        let body: Value = resp.json().await?;
        if let Some(err) = body.get("error") {
            return Err(MetadataError::Service(err.to_string()));
        }
        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Fill gaps from the off-chain JSON document the asset points at.
    async fn fill_from_json_uri(&self, uri: &str, meta: &mut TokenMeta) {
        let doc: Value = match self.http.get(uri).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json().await {
                Ok(doc) => doc,
                Err(e) => {
                    debug!(%uri, error = %e, "Off-chain metadata is not JSON");
                    return;
                }
            },
            Ok(resp) => {
                debug!(%uri, status = %resp.status(), "Off-chain metadata unavailable");
                return;
            }
            Err(e) => {
                debug!(%uri, error = %e, "Off-chain metadata request failed");
                return;
            }
        };

        if let Some(image) = non_empty_str(doc.get("image")) {
            meta.logo_uri = image;
        }
        if meta.name.is_empty() {
            if let Some(name) = non_empty_str(doc.get("name")) {
                meta.name = name;
            }
        }
        if meta.symbol.is_empty() {
            if let Some(symbol) = non_empty_str(doc.get("symbol")) {
                meta.symbol = symbol;
            }
        }
    }
}

#[async_trait]
impl MetadataSource for DasMetadataSource {
    fn supports(&self, endpoint: &str) -> bool {
        self.markers.iter().any(|m| !m.is_empty() && endpoint.contains(m.as_str()))
    }

    async fn batch_lookup(
        &self,
        endpoint: &str,
        ids: &[String],
    ) -> Result<HashMap<String, TokenMeta>, MetadataError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": "token-batch",
            "method": "getAssetBatch",
            "params": {
                "ids": ids,
                "displayOptions": { "showFungible": true },
            },
        });
        let result = self.call(endpoint, payload).await?;

        let mut out = HashMap::new();
        for asset in result.as_array().into_iter().flatten() {
            let Some(id) = non_empty_str(asset.get("id")) else {
                continue;
            };
            out.insert(id, asset_meta(asset));
        }
        Ok(out)
    }

    async fn lookup(&self, endpoint: &str, id: &str) -> Result<Option<TokenMeta>, MetadataError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": "token-single",
            "method": "getAsset",
            "params": {
                "id": id,
                "displayOptions": { "showFungible": true },
            },
        });
        let result = self.call(endpoint, payload).await?;
        let Some(content) = result.get("content").filter(|c| c.is_object()) else {
            return Ok(None);
        };

        let mut meta = asset_meta(&result);
        if meta.logo_uri.is_empty() {
            if let Some(uri) = non_empty_str(content.get("json_uri")) {
                self.fill_from_json_uri(&uri, &mut meta).await;
            }
        }
        if meta.is_empty() {
            warn!(%id, "Asset has no usable metadata");
        }
        Ok(Some(meta))
    }
}

fn asset_meta(asset: &Value) -> TokenMeta {
    let content = asset.get("content");
    let metadata = content.and_then(|c| c.get("metadata"));
    let links = content.and_then(|c| c.get("links"));
    TokenMeta {
        name: non_empty_str(metadata.and_then(|m| m.get("name"))).unwrap_or_default(),
        symbol: non_empty_str(metadata.and_then(|m| m.get("symbol"))).unwrap_or_default(),
        logo_uri: non_empty_str(links.and_then(|l| l.get("image"))).unwrap_or_default(),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_matches_markers() {
        let source =
            DasMetadataSource::new(vec!["helius".to_string()], Duration::from_secs(1)).unwrap();
        assert!(source.supports("https://mainnet.helius-rpc.com/?api-key=abc"));
        assert!(!source.supports("https://api.mainnet-beta.solana.com"));

        let none = DasMetadataSource::new(vec![String::new()], Duration::from_secs(1)).unwrap();
        assert!(!none.supports("https://anything"));
    }

    #[test]
    fn test_asset_meta_reads_content() {
        let asset = json!({
            "id": "Mint",
            "content": {
                "metadata": { "name": "Meteor", "symbol": "MTR" },
                "links": { "image": "https://img/mtr.png" },
            },
        });
        let meta = asset_meta(&asset);
        assert_eq!(meta.name, "Meteor");
        assert_eq!(meta.symbol, "MTR");
        assert_eq!(meta.logo_uri, "https://img/mtr.png");

        assert_eq!(asset_meta(&json!({ "id": "Mint" })), TokenMeta::empty());
    }
}

//! Configuration module for the launchpad contributor
//!
//! This module handles configuration loading from TOML files and
//! environment variables, and provides structured configuration types.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentLevel;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::launch::LaunchVersion;
use crate::tx_builder::SendOptions;

pub const ENV_RPC_URL: &str = "LAUNCHPAD_RPC_URL";
pub const ENV_KEYPAIR: &str = "LAUNCHPAD_KEYPAIR";
pub const ENV_DAS_ENDPOINT: &str = "LAUNCHPAD_DAS_ENDPOINT";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub wallet: WalletConfig,

    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Defaults applied to every send
    #[serde(default)]
    pub send: SendOptions,

    /// Launch account snapshots, one per schema version
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_url")]
    pub url: String,

    #[serde(default = "default_commitment")]
    pub commitment: CommitmentLevel,

    /// Delay between signature status polls while confirming
    #[serde(default = "default_confirm_poll_interval")]
    pub confirm_poll_interval_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path to keypair file
    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// DAS endpoint; falls back to the RPC URL
    #[serde(default)]
    pub das_endpoint: Option<String>,

    /// Substrings identifying endpoints that speak DAS
    #[serde(default = "default_das_markers")]
    pub das_markers: Vec<String>,

    #[serde(default = "default_metadata_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    pub version: LaunchVersion,
    pub path: PathBuf,
}

// Default value functions
fn default_rpc_url() -> String { "https://api.mainnet-beta.solana.com".to_string() }
fn default_commitment() -> CommitmentLevel { CommitmentLevel::Confirmed }
fn default_confirm_poll_interval() -> u64 { 500 }
fn default_rpc_timeout() -> u64 { 30 }
fn default_keypair_path() -> String { "~/.config/solana/id.json".to_string() }
fn default_das_markers() -> Vec<String> { vec!["helius".to_string()] }
fn default_metadata_timeout() -> u64 { 10 }

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            commitment: default_commitment(),
            confirm_poll_interval_ms: default_confirm_poll_interval(),
            timeout_secs: default_rpc_timeout(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keypair_path: default_keypair_path(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            das_endpoint: None,
            das_markers: default_das_markers(),
            timeout_secs: default_metadata_timeout(),
        }
    }
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval_ms)
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration with `.env` and environment variable overrides.
    ///
    /// A missing file is not an error: defaults are used instead.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let path = path.as_ref();

        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            warn!("Config file '{}' not found, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_RPC_URL) {
            self.rpc.url = url;
        }
        if let Some(path) = get(ENV_KEYPAIR) {
            self.wallet.keypair_path = path;
        }
        if let Some(endpoint) = get(ENV_DAS_ENDPOINT) {
            self.metadata.das_endpoint = Some(endpoint);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc.url.trim().is_empty() {
            bail!("rpc.url must not be empty");
        }
        if self.rpc.confirm_poll_interval_ms == 0 {
            bail!("rpc.confirm_poll_interval_ms must be greater than zero");
        }
        let margin = self.send.compute_unit_limit_margin;
        if !margin.is_finite() || margin < 1.0 {
            bail!("send.compute_unit_limit_margin must be a finite number >= 1.0, got {}", margin);
        }
        Ok(())
    }

    /// Endpoint handed to metadata enrichment
    pub fn das_endpoint(&self) -> &str {
        self.metadata
            .das_endpoint
            .as_deref()
            .unwrap_or(self.rpc.url.as_str())
    }

    /// Keypair path with a leading `~/` expanded
    pub fn keypair_path(&self) -> PathBuf {
        let raw = self.wallet.keypair_path.as_str();
        match (raw.strip_prefix("~/"), std::env::var_os("HOME")) {
            (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
            _ => PathBuf::from(raw),
        }
    }
}

//! Client configuration

use pledge_ipfs::HttpStoreConfig;
use pledge_ledger::RpcLedgerConfig;
use pledge_pipeline::{PipelineSettings, SuccessPolicy};
use pledge_types::{ChainContext, ChainId, ContractBook};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `ipfs.api_token`
pub const IPFS_TOKEN_ENV: &str = "PLEDGE_IPFS_TOKEN";

/// Global client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ipfs: HttpStoreConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub subgraph: SubgraphConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Chain the contracts live on, CAIP-2 or alias (e.g. "base:sepolia")
    pub chain: ChainId,
    /// Account the signer gateway signs with
    pub account: Option<String>,
    /// Signer gateway JSON-RPC endpoint
    pub endpoint: String,
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub contracts: ContractBook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubgraphConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Allow repeating an action after it succeeded
    #[serde(default)]
    pub rearm_after_success: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let rpc = RpcLedgerConfig::default();
        Self {
            chain: ChainId::eip155(84532),
            account: None,
            endpoint: rpc.endpoint,
            timeout_secs: rpc.timeout_secs,
            poll_interval_ms: rpc.poll_interval_ms,
            contracts: ContractBook::default(),
        }
    }
}

impl Default for SubgraphConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/subgraphs/name/pledge".to_string(),
            timeout_secs: 30,
        }
    }
}

impl LedgerConfig {
    pub fn rpc(&self) -> RpcLedgerConfig {
        RpcLedgerConfig {
            endpoint: self.endpoint.clone(),
            timeout_secs: self.timeout_secs,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Network context for a pipeline; `account` wins over the configured one
    pub fn context(&self, account: Option<&str>) -> ChainContext {
        let context = ChainContext::new(self.chain.clone(), self.contracts.clone());
        match account.or(self.account.as_deref()) {
            Some(account) => context.with_account(account),
            None => context,
        }
    }
}

impl PipelineConfig {
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            success_policy: if self.rearm_after_success {
                SuccessPolicy::Rearm
            } else {
                SuccessPolicy::LockTrigger
            },
        }
    }
}

impl Config {
    /// Load config from file, or use defaults. `PLEDGE_IPFS_TOKEN` is applied on top.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let config = Self::load_file(path)?;
        Ok(config.with_ipfs_token(std::env::var(IPFS_TOKEN_ENV).ok()))
    }

    fn load_file(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)
                .map_err(|e| crate::CliError::Config(format!("Failed to parse config: {}", e)))
        } else {
            Ok(Self::default())
        }
    }

    /// Replace the pinning-service token when one is given
    pub fn with_ipfs_token(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.ipfs.api_token = Some(token);
        }
        self
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::CliError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the base pledge directory
    pub fn pledge_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".pledge"))
            .unwrap_or_else(|| PathBuf::from(".pledge"))
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::pledge_dir().join("config.toml")
    }
}

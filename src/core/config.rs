use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use super::domain::Network;
use super::errors::{BridgeError, Result};
use super::validation::validate_ethereum_address;

/// Native currency advertised when registering a chain with a wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NativeCurrencyConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for NativeCurrencyConfig {
    fn default() -> Self {
        Self { name: "Ether".to_string(), symbol: "ETH".to_string(), decimals: 18 }
    }
}

/// Blockchain network configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc_url: String,
    pub chain_id: u64,
    #[serde(default)]
    pub native_currency: NativeCurrencyConfig,
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
}

/// The two chains the bridge spans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworksConfig {
    #[serde(default = "NetworksConfig::default_mainnet")]
    pub mainnet: NetworkConfig,
    #[serde(default = "NetworksConfig::default_mvm")]
    pub mvm: NetworkConfig,
}

impl NetworksConfig {
    fn default_mainnet() -> NetworkConfig {
        NetworkConfig {
            name: "Ethereum Mainnet".to_string(),
            rpc_url: "https://eth.llamarpc.com".to_string(),
            chain_id: 1,
            native_currency: NativeCurrencyConfig::default(),
            block_explorer_urls: vec!["https://etherscan.io".to_string()],
        }
    }

    fn default_mvm() -> NetworkConfig {
        NetworkConfig {
            name: "Mixin Virtual Machine".to_string(),
            rpc_url: "https://geth.mvm.dev".to_string(),
            chain_id: 73927,
            native_currency: NativeCurrencyConfig::default(),
            block_explorer_urls: vec!["https://scan.mvm.dev".to_string()],
        }
    }
}

impl NetworksConfig {
    pub fn get(&self, network: Network) -> &NetworkConfig {
        match network {
            Network::Mainnet => &self.mainnet,
            Network::Mvm => &self.mvm,
        }
    }
}

impl Default for NetworksConfig {
    fn default() -> Self {
        Self { mainnet: Self::default_mainnet(), mvm: Self::default_mvm() }
    }
}

/// Bridge contract and extra-payload constants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractsConfig {
    /// Bridge contract exposing `release(address,bytes)` on the settlement chain
    #[serde(default = "ContractsConfig::default_bridge_address")]
    pub bridge_address: String,
    /// Registry process id, 32 hex chars without dashes
    #[serde(default = "ContractsConfig::default_registry_pid")]
    pub registry_pid: String,
    /// Storage contract address embedded in every extra payload
    #[serde(default = "ContractsConfig::default_storage_address")]
    pub storage_address: String,
    /// Receiver of withdrawal actions. Deployment specific, no default.
    #[serde(default)]
    pub withdrawal_bot: String,
}

impl ContractsConfig {
    fn default_bridge_address() -> String {
        "0x0915eae769d68128eed9711a0bc4097831be57f3".to_string()
    }
    fn default_registry_pid() -> String {
        "bd67087276ce3263b9333aa337e212a4".to_string()
    }
    fn default_storage_address() -> String {
        "0xef241988d19892fe4eff4935256087f4fdc5ecaa".to_string()
    }
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            bridge_address: Self::default_bridge_address(),
            registry_pid: Self::default_registry_pid(),
            storage_address: Self::default_storage_address(),
            withdrawal_bot: String::new(),
        }
    }
}

/// Well-known native asset ids used by the classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetIdsConfig {
    #[serde(default = "AssetIdsConfig::default_eth_asset_id")]
    pub source_native_asset_id: String,
    #[serde(default = "AssetIdsConfig::default_eth_asset_id")]
    pub settlement_native_asset_id: String,
}

impl AssetIdsConfig {
    fn default_eth_asset_id() -> String {
        "43d61dcd-e413-450d-80b8-101d5e903357".to_string()
    }
}

impl Default for AssetIdsConfig {
    fn default() -> Self {
        Self {
            source_native_asset_id: Self::default_eth_asset_id(),
            settlement_native_asset_id: Self::default_eth_asset_id(),
        }
    }
}

/// External read API endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ApiConfig::default_swap_base_url")]
    pub swap_base_url: String,
    #[serde(default = "ApiConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    fn default_base_url() -> String {
        "https://api.mixin.one".to_string()
    }
    fn default_swap_base_url() -> String {
        "https://api.4swap.org".to_string()
    }
    fn default_timeout_secs() -> u64 {
        10
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            swap_base_url: Self::default_swap_base_url(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// Gas settings for submitted calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GasConfig {
    /// Gas price (wei) for settlement-chain calls
    #[serde(default = "GasConfig::default_settlement_gas_price")]
    pub settlement_gas_price: u64,
    #[serde(default = "GasConfig::default_settlement_gas_limit")]
    pub settlement_gas_limit: u64,
    /// Gas limit headroom for token deposits on the source chain
    #[serde(default = "GasConfig::default_deposit_token_gas_limit")]
    pub deposit_token_gas_limit: u64,
}

impl GasConfig {
    fn default_settlement_gas_price() -> u64 {
        10_000_000
    }
    fn default_settlement_gas_limit() -> u64 {
        350_000
    }
    fn default_deposit_token_gas_limit() -> u64 {
        300_000
    }
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            settlement_gas_price: Self::default_settlement_gas_price(),
            settlement_gas_limit: Self::default_settlement_gas_limit(),
            deposit_token_gas_limit: Self::default_deposit_token_gas_limit(),
        }
    }
}

/// Ledger polling and fee cache policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerConfig {
    #[serde(default = "LedgerConfig::default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Replace a cached fee quote whose fetch failed on the next request
    #[serde(default)]
    pub fee_retry_failed: bool,
    /// Age after which a cached fee quote is fetched again
    #[serde(default)]
    pub fee_ttl_secs: Option<u64>,
}

impl LedgerConfig {
    fn default_poll_interval_secs() -> u64 {
        15
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: Self::default_poll_interval_secs(),
            fee_retry_failed: false,
            fee_ttl_secs: None,
        }
    }
}

/// Bridge wallet configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    #[serde(default)]
    pub networks: NetworksConfig,
    #[serde(default)]
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub assets: AssetIdsConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl BridgeConfig {
    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BridgeError::Config(format!("Invalid config: {}", e)))
    }

    /// Load and validate configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded bridge configuration");
        Ok(config)
    }

    /// Load from `CONFIG_PATH` (default `config.toml`). Only a missing file
    /// falls back to defaults; a present but invalid file is an error.
    pub fn from_env() -> Result<Self> {
        let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_or_default(config_path)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found. Using default configuration");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<()> {
        validate_ethereum_address(&self.contracts.bridge_address)
            .map_err(|e| BridgeError::Config(format!("bridge_address: {}", e)))?;
        validate_ethereum_address(&self.contracts.storage_address)
            .map_err(|e| BridgeError::Config(format!("storage_address: {}", e)))?;

        let pid = &self.contracts.registry_pid;
        if pid.len() != 32 || !pid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BridgeError::Config(
                "registry_pid must be 32 hex characters without dashes".to_string(),
            ));
        }
        if self.contracts.withdrawal_bot.trim().is_empty() {
            return Err(BridgeError::Config("withdrawal_bot must be set".to_string()));
        }
        if self.networks.mainnet.chain_id == self.networks.mvm.chain_id {
            return Err(BridgeError::Config(
                "mainnet and mvm must use different chain ids".to_string(),
            ));
        }
        Ok(())
    }
}

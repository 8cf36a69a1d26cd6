//! Points the wallet at the chain an operation needs, registering the
//! chain with the wallet first when it is unknown there.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::provider::{ProviderRpcError, WalletProvider, ADD_CHAIN_METHOD, SWITCH_CHAIN_METHOD};
use crate::core::config::{NativeCurrencyConfig, NetworkConfig, NetworksConfig};
use crate::core::domain::Network;
use crate::core::errors::{BridgeError, Result};
use crate::utils::to_hex_chain_id;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl From<&NativeCurrencyConfig> for NativeCurrency {
    fn from(config: &NativeCurrencyConfig) -> Self {
        Self { name: config.name.clone(), symbol: config.symbol.clone(), decimals: config.decimals }
    }
}

/// Parameters of `wallet_addEthereumChain`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddEthereumChainParameter {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
}

impl From<&NetworkConfig> for AddEthereumChainParameter {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            chain_id: to_hex_chain_id(config.chain_id),
            chain_name: config.name.clone(),
            native_currency: NativeCurrency::from(&config.native_currency),
            rpc_urls: vec![config.rpc_url.clone()],
            block_explorer_urls: config.block_explorer_urls.clone(),
        }
    }
}

/// Requests a switch to `network`. On "unrecognized chain" the chain is
/// added (which also selects it) with no second switch attempt.
pub async fn ensure_network(
    provider: &dyn WalletProvider,
    networks: &NetworksConfig,
    network: Network,
) -> Result<()> {
    let config = networks.get(network);
    let chain_id = to_hex_chain_id(config.chain_id);
    info!(%network, chain_id = %chain_id, "Switching wallet network");

    match provider.request(SWITCH_CHAIN_METHOD, json!([{ "chainId": chain_id }])).await {
        Ok(_) => Ok(()),
        Err(e) if e.code == ProviderRpcError::UNRECOGNIZED_CHAIN => {
            warn!(%network, chain_id = %chain_id, "Chain unknown to wallet, adding it");
            let params = AddEthereumChainParameter::from(config);
            provider
                .request(ADD_CHAIN_METHOD, json!([params]))
                .await
                .map(|_| ())
                .map_err(|e| BridgeError::Provider(format!("Failed to add {}: {}", network, e)))
        }
        Err(e) if e.code == ProviderRpcError::UNSUPPORTED_METHOD => Err(BridgeError::Provider(
            format!("Wallet cannot switch networks: {}", e.message),
        )),
        Err(e) => Err(BridgeError::Provider(format!("Switch to {} failed: {}", network, e))),
    }
}

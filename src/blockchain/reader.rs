use ethers::{
    prelude::JsonRpcClient,
    providers::{Http, Middleware, Provider},
    types::U256,
    utils::format_units,
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

use super::contracts::erc20::Erc20Token;
use crate::core::config::NetworksConfig;
use crate::core::domain::Network;
use crate::core::errors::{BridgeError, Result};
use crate::core::validation::parse_address;

/// Read-only access to one chain: native and token balances.
#[derive(Clone)]
pub struct ChainReader<P: JsonRpcClient + Clone = Http> {
    provider: Arc<Provider<P>>,
    network: Network,
}

impl ChainReader<Http> {
    pub fn connect(network: Network, rpc_url: &str) -> Result<Self> {
        let rpc_url_clean = rpc_url.trim();
        let parsed_url = reqwest::Url::parse(rpc_url_clean).map_err(|e| {
            BridgeError::Config(format!("Invalid {} RPC URL '{}': {}", network, rpc_url_clean, e))
        })?;

        info!(%network, url = %parsed_url, "Connecting chain reader");
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(10));
        if let Ok(proxy) = std::env::var("HTTPS_PROXY").or_else(|_| std::env::var("HTTP_PROXY")) {
            if let Ok(p) = reqwest::Proxy::all(proxy) {
                builder = builder.proxy(p);
            }
        }
        let client = builder
            .build()
            .map_err(|e| BridgeError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let provider = Provider::new(Http::new_with_client(parsed_url, client));
        Ok(Self::new_with_provider(provider, network))
    }
}

impl<P> ChainReader<P>
where
    P: JsonRpcClient + Clone + 'static,
{
    /// Creates a reader over a given provider, e.g. a `MockProvider` in tests.
    pub fn new_with_provider(provider: Provider<P>, network: Network) -> Self {
        Self { provider: Arc::new(provider), network }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Native balance of `account`, formatted with `decimals`.
    pub async fn get_balance(&self, account: &str, decimals: u32) -> Result<String> {
        let address = parse_address(account)?;
        let balance = self.provider.get_balance(address, None).await.map_err(|e| {
            BridgeError::Blockchain(format!("Failed to get {} balance: {}", self.network, e))
        })?;
        debug!(network = %self.network, balance = %balance, "Fetched native balance");
        format_balance(balance, decimals)
    }

    pub async fn token_decimals(&self, contract: &str) -> Result<u8> {
        let token = Erc20Token::new(parse_address(contract)?, self.provider.clone());
        token.decimals().call().await.map_err(|e| {
            BridgeError::Blockchain(format!("Failed to read decimals of {}: {}", contract, e))
        })
    }

    /// Token balance of `account`, formatted with the token's own decimals.
    pub async fn get_erc20_balance(&self, account: &str, contract: &str) -> Result<String> {
        let owner = parse_address(account)?;
        let token = Erc20Token::new(parse_address(contract)?, self.provider.clone());
        let decimals = token.decimals().call().await.map_err(|e| {
            BridgeError::Blockchain(format!("Failed to read decimals of {}: {}", contract, e))
        })?;
        let balance = token.balance_of(owner).call().await.map_err(|e| {
            BridgeError::Blockchain(format!("Failed to read balance on {}: {}", contract, e))
        })?;
        format_balance(balance, decimals as u32)
    }
}

fn format_balance(balance: U256, decimals: u32) -> Result<String> {
    let formatted = format_units(balance, decimals)?;
    // format_units always renders the fraction; trim it like a decimal would.
    Ok(match formatted.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                whole.to_string()
            } else {
                format!("{}.{}", whole, frac)
            }
        }
        None => formatted,
    })
}

/// Readers for both chains.
#[derive(Clone)]
pub struct ChainReaders<P: JsonRpcClient + Clone = Http> {
    pub mainnet: ChainReader<P>,
    pub mvm: ChainReader<P>,
}

impl ChainReaders<Http> {
    pub fn connect(networks: &NetworksConfig) -> Result<Self> {
        Ok(Self {
            mainnet: ChainReader::connect(Network::Mainnet, &networks.mainnet.rpc_url)?,
            mvm: ChainReader::connect(Network::Mvm, &networks.mvm.rpc_url)?,
        })
    }
}

impl<P: JsonRpcClient + Clone> ChainReaders<P> {
    pub fn get(&self, network: Network) -> &ChainReader<P> {
        match network {
            Network::Mainnet => &self.mainnet,
            Network::Mvm => &self.mvm,
        }
    }
}

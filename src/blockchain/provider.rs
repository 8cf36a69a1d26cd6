//! Wallet provider abstraction: the EIP-1193 style request channel plus
//! a signer for the chain the wallet currently points at.

use async_trait::async_trait;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Provider},
    signers::{LocalWallet, Signer},
    types::Address,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::network::AddEthereumChainParameter;
use super::signer::{ChainSigner, MiddlewareSigner};
use crate::core::errors::{BridgeError, Result};
use crate::utils::{parse_hex_chain_id, to_hex_chain_id};

pub const SWITCH_CHAIN_METHOD: &str = "wallet_switchEthereumChain";
pub const ADD_CHAIN_METHOD: &str = "wallet_addEthereumChain";

/// Error surfaced by a wallet provider request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
}

impl ProviderRpcError {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const DISCONNECTED: i64 = 4900;
    /// The wallet does not know the requested chain.
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    pub const INVALID_PARAMS: i64 = -32602;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn unrecognized_chain(chain_id: &str) -> Self {
        Self::new(Self::UNRECOGNIZED_CHAIN, format!("Unrecognized chain ID \"{}\"", chain_id))
    }

    pub fn unsupported_method(method: &str) -> Self {
        Self::new(Self::UNSUPPORTED_METHOD, format!("Method {} is not supported", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_PARAMS, message)
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Raw JSON-RPC style request (`wallet_switchEthereumChain`, ...).
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError>;

    /// Signer bound to the currently active chain.
    async fn signer(&self) -> Result<Arc<dyn ChainSigner>>;
}

#[derive(Debug, Clone)]
struct KnownChain {
    name: String,
    rpc_url: String,
}

/// Wallet backed by a local private key. Keeps its own registry of known
/// chains and answers switch/add requests the way a browser wallet does.
pub struct LocalWalletProvider {
    wallet: LocalWallet,
    chains: RwLock<HashMap<u64, KnownChain>>,
    active_chain: RwLock<Option<u64>>,
}

impl LocalWalletProvider {
    pub fn new(wallet: LocalWallet) -> Self {
        Self { wallet, chains: RwLock::new(HashMap::new()), active_chain: RwLock::new(None) }
    }

    /// Key as hex, with or without `0x`.
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let wallet = private_key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| BridgeError::Config(format!("Invalid private key: {}", e)))?;
        Ok(Self::new(wallet))
    }

    /// Registers a chain up front, as if the user had added it before.
    pub fn with_chain(self, chain_id: u64, name: impl Into<String>, rpc_url: impl Into<String>) -> Self {
        self.chains
            .write()
            .insert(chain_id, KnownChain { name: name.into(), rpc_url: rpc_url.into() });
        self
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn active_chain_id(&self) -> Option<u64> {
        *self.active_chain.read()
    }

    pub fn knows_chain(&self, chain_id: u64) -> bool {
        self.chains.read().contains_key(&chain_id)
    }

    fn switch_chain(&self, params: &Value) -> Result<Value, ProviderRpcError> {
        let requested = params
            .get(0)
            .and_then(|p| p.get("chainId"))
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderRpcError::invalid_params("expected [{ chainId }]"))?;
        let chain_id = parse_hex_chain_id(requested)
            .ok_or_else(|| ProviderRpcError::invalid_params(format!("bad chainId {}", requested)))?;

        let name = match self.chains.read().get(&chain_id) {
            Some(chain) => chain.name.clone(),
            None => return Err(ProviderRpcError::unrecognized_chain(requested)),
        };
        *self.active_chain.write() = Some(chain_id);
        info!(chain_id, chain = %name, "Wallet switched chain");
        Ok(Value::Null)
    }

    fn add_chain(&self, params: &Value) -> Result<Value, ProviderRpcError> {
        let raw = params
            .get(0)
            .cloned()
            .ok_or_else(|| ProviderRpcError::invalid_params("expected [chain parameters]"))?;
        let chain: AddEthereumChainParameter = serde_json::from_value(raw)
            .map_err(|e| ProviderRpcError::invalid_params(e.to_string()))?;
        let chain_id = parse_hex_chain_id(&chain.chain_id).ok_or_else(|| {
            ProviderRpcError::invalid_params(format!("bad chainId {}", chain.chain_id))
        })?;
        let rpc_url = chain
            .rpc_urls
            .first()
            .cloned()
            .ok_or_else(|| ProviderRpcError::invalid_params("rpcUrls must not be empty"))?;

        self.chains.write().insert(chain_id, KnownChain { name: chain.chain_name.clone(), rpc_url });
        // Adding a chain also selects it.
        *self.active_chain.write() = Some(chain_id);
        info!(chain_id, chain = %chain.chain_name, "Wallet added chain");
        Ok(Value::Null)
    }
}

#[async_trait]
impl WalletProvider for LocalWalletProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        debug!(method, "Wallet request");
        match method {
            SWITCH_CHAIN_METHOD => self.switch_chain(&params),
            ADD_CHAIN_METHOD => self.add_chain(&params),
            "eth_chainId" => self
                .active_chain_id()
                .map(|id| Value::String(to_hex_chain_id(id)))
                .ok_or_else(|| ProviderRpcError::new(ProviderRpcError::DISCONNECTED, "No active chain")),
            "eth_accounts" => Ok(Value::Array(vec![Value::String(format!("{:?}", self.address()))])),
            other => Err(ProviderRpcError::unsupported_method(other)),
        }
    }

    async fn signer(&self) -> Result<Arc<dyn ChainSigner>> {
        let chain_id = self
            .active_chain_id()
            .ok_or_else(|| BridgeError::Provider("Wallet has no active chain".to_string()))?;
        let rpc_url = self
            .chains
            .read()
            .get(&chain_id)
            .map(|chain| chain.rpc_url.clone())
            .ok_or_else(|| BridgeError::Provider(format!("Unknown chain {}", chain_id)))?;

        let provider = Provider::<Http>::try_from(rpc_url.as_str())
            .map_err(|e| BridgeError::Config(format!("Invalid RPC URL '{}': {}", rpc_url, e)))?;
        let client = SignerMiddleware::new(provider, self.wallet.clone().with_chain_id(chain_id));
        Ok(Arc::new(MiddlewareSigner::new(client)))
    }
}

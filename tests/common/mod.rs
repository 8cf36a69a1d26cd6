//! Shared mocks and fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use ethers::abi::AbiEncode;
use ethers::types::{Address, Bytes, TransactionRequest, TxHash, H256, U256};
use mvm_bridge_wallet::api::BridgeApi;
use mvm_bridge_wallet::blockchain::provider::{
    ProviderRpcError, WalletProvider, ADD_CHAIN_METHOD, SWITCH_CHAIN_METHOD,
};
use mvm_bridge_wallet::blockchain::signer::ChainSigner;
use mvm_bridge_wallet::core::config::BridgeConfig;
use mvm_bridge_wallet::core::domain::{
    ActionRequest, ActionResponse, Asset, CodeResponse, ExchangeRate, Pair, RegisteredUser,
};
use mvm_bridge_wallet::{BridgeError, Result};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const ETH: &str = "43d61dcd-e413-450d-80b8-101d5e903357";
pub const USDT: &str = "4d8c508b-91c5-375b-92b0-ee702ed2dac5";
pub const BTC: &str = "c6d0c728-2624-429b-8e0d-d9d19b6592fa";
pub const SOURCE_TOKEN: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";
pub const MVM_TOKEN: &str = "0x94a6a5d2c5a6a0b0e2f6a2c0e1a2d3b4c5d6e7f8";
pub const DEPOSIT_ADDRESS: &str = "0x1616b057f8a89955d4a4f9fd9eb10289ac0e44d2";
pub const USER_CONTRACT: &str = "0x7b81987bf2e1869c0bfc9ae22c83ea99efd53339";
pub const WITHDRAW_TO: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";

pub fn config() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.contracts.withdrawal_bot = "a753e0eb-3010-4c4a-a7b2-a7bda4063f62".to_string();
    config
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub fn eth_asset() -> Asset {
    Asset {
        asset_id: ETH.into(),
        chain_id: ETH.into(),
        destination: DEPOSIT_ADDRESS.into(),
        symbol: "ETH".into(),
        name: "Ether".into(),
        balance: Some(dec("2")),
        price_usd: dec("3"),
        price_btc: dec("0.05"),
        ..Default::default()
    }
}

/// USDT, transferable on both chains.
pub fn usdt_asset() -> Asset {
    Asset {
        asset_id: USDT.into(),
        chain_id: ETH.into(),
        contract: Some(MVM_TOKEN.into()),
        asset_key: SOURCE_TOKEN.into(),
        destination: DEPOSIT_ADDRESS.into(),
        symbol: "USDT".into(),
        name: "Tether USD".into(),
        balance: Some(dec("1")),
        price_usd: dec("5"),
        price_btc: dec("0.0001"),
        ..Default::default()
    }
}

pub fn btc_asset() -> Asset {
    Asset {
        asset_id: BTC.into(),
        chain_id: BTC.into(),
        symbol: "BTC".into(),
        ..Default::default()
    }
}

pub fn user() -> RegisteredUser {
    RegisteredUser {
        user_id: "e9e5b807-fa8b-455a-8dfa-b189d28310ff".into(),
        contract: USER_CONTRACT.into(),
        access_token: Some("token".into()),
    }
}

/// Ordered log of every provider request and signer submission.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub struct RecordingSigner {
    pub events: EventLog,
    pub sent: Mutex<Vec<TransactionRequest>>,
    pub calls: Mutex<Vec<(Address, Bytes)>>,
    pub token_decimals: u8,
}

impl RecordingSigner {
    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl ChainSigner for RecordingSigner {
    async fn address(&self) -> Result<Address> {
        Ok(Address::repeat_byte(0xaa))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.events.lock().push("call".to_string());
        self.calls.lock().push((to, data));
        Ok(Bytes::from(U256::from(self.token_decimals).encode()))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let mut sent = self.sent.lock();
        sent.push(tx);
        self.events.lock().push("send".to_string());
        Ok(H256::from_low_u64_be(sent.len() as u64))
    }
}

/// Wallet provider double. Switches succeed for known chains and fail
/// with 4902 otherwise, unless `switch_error` overrides the outcome.
pub struct RecordingProvider {
    pub events: EventLog,
    pub requests: Mutex<Vec<(String, Value)>>,
    pub known_chains: Mutex<HashSet<String>>,
    pub switch_error: Mutex<Option<ProviderRpcError>>,
    pub signer: Arc<RecordingSigner>,
}

impl RecordingProvider {
    pub fn new(known_chains: &[&str]) -> Arc<Self> {
        let events: EventLog = Arc::new(Mutex::new(Vec::new()));
        Arc::new(Self {
            events: Arc::clone(&events),
            requests: Mutex::new(Vec::new()),
            known_chains: Mutex::new(known_chains.iter().map(|c| c.to_string()).collect()),
            switch_error: Mutex::new(None),
            signer: Arc::new(RecordingSigner {
                events,
                sent: Mutex::new(Vec::new()),
                calls: Mutex::new(Vec::new()),
                token_decimals: 6,
            }),
        })
    }

    /// Knows both default chains.
    pub fn connected() -> Arc<Self> {
        Self::new(&["0x1", "0x120c7"])
    }

    pub fn fail_switch_with(&self, error: ProviderRpcError) {
        *self.switch_error.lock() = Some(error);
    }

    pub fn methods(&self) -> Vec<String> {
        self.requests.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl WalletProvider for RecordingProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        self.requests.lock().push((method.to_string(), params.clone()));
        self.events.lock().push(method.to_string());
        match method {
            SWITCH_CHAIN_METHOD => {
                if let Some(err) = self.switch_error.lock().clone() {
                    return Err(err);
                }
                let chain_id = params[0]["chainId"].as_str().unwrap_or_default().to_string();
                if self.known_chains.lock().contains(&chain_id) {
                    Ok(Value::Null)
                } else {
                    Err(ProviderRpcError::unrecognized_chain(&chain_id))
                }
            }
            ADD_CHAIN_METHOD => {
                let chain_id = params[0]["chainId"].as_str().unwrap_or_default().to_string();
                self.known_chains.lock().insert(chain_id);
                Ok(Value::Null)
            }
            other => Err(ProviderRpcError::unsupported_method(other)),
        }
    }

    async fn signer(&self) -> Result<Arc<dyn ChainSigner>> {
        let signer: Arc<dyn ChainSigner> = self.signer.clone();
        Ok(signer)
    }
}

/// In-memory [`BridgeApi`] with call counters.
pub struct MockApi {
    pub assets: Mutex<Result<Vec<Asset>>>,
    pub pairs: Mutex<Vec<Pair>>,
    pub withdrawal_fees: Mutex<HashMap<String, Decimal>>,
    pub fee_on_asset: Decimal,
    pub asset_fetches: AtomicUsize,
    pub pair_fetches: AtomicUsize,
    pub fee_fetches: AtomicUsize,
    pub conversions: AtomicUsize,
    pub actions: Mutex<Vec<ActionRequest>>,
    pub code: CodeResponse,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            assets: Mutex::new(Ok(vec![eth_asset(), usdt_asset()])),
            pairs: Mutex::new(Vec::new()),
            withdrawal_fees: Mutex::new(HashMap::new()),
            fee_on_asset: dec("1.5"),
            asset_fetches: AtomicUsize::new(0),
            pair_fetches: AtomicUsize::new(0),
            fee_fetches: AtomicUsize::new(0),
            conversions: AtomicUsize::new(0),
            actions: Mutex::new(Vec::new()),
            code: CodeResponse {
                receivers: vec!["r1".into(), "r2".into()],
                threshold: 1,
                memo: "swap-memo".into(),
            },
        })
    }

    pub fn set_assets(&self, assets: Result<Vec<Asset>>) {
        *self.assets.lock() = assets;
    }

    pub fn set_fee(&self, asset_id: &str, fee: &str) {
        self.withdrawal_fees.lock().insert(asset_id.to_string(), dec(fee));
    }
}

#[async_trait]
impl BridgeApi for MockApi {
    async fn fetch_assets(&self, _user: &RegisteredUser) -> Result<Vec<Asset>> {
        self.asset_fetches.fetch_add(1, Ordering::SeqCst);
        self.assets.lock().clone()
    }

    async fn fetch_pairs(&self) -> Result<Vec<Pair>> {
        self.pair_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.pairs.lock().clone())
    }

    async fn fetch_exchange_rates(&self) -> Result<Vec<ExchangeRate>> {
        Ok(vec![ExchangeRate { code: "EUR".into(), rate: dec("0.92") }])
    }

    async fn fetch_withdrawal_fee(&self, asset_id: &str, _destination: &str) -> Result<Decimal> {
        self.fee_fetches.fetch_add(1, Ordering::SeqCst);
        self.withdrawal_fees
            .lock()
            .get(asset_id)
            .copied()
            .ok_or_else(|| BridgeError::Api { code: 404, description: "no fee".into() })
    }

    async fn fetch_fee_on_asset(&self, _asset_id: &str, _chain_id: &str, _fee: Decimal) -> Result<Decimal> {
        self.conversions.fetch_add(1, Ordering::SeqCst);
        Ok(self.fee_on_asset)
    }

    async fn create_action(&self, request: &ActionRequest, _user: &RegisteredUser) -> Result<ActionResponse> {
        self.actions.lock().push(request.clone());
        Ok(ActionResponse { code: "code-1".into() })
    }

    async fn fetch_code(&self, _code: &str) -> Result<CodeResponse> {
        Ok(self.code.clone())
    }
}

use ethers::types::TxHash;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::api::{BridgeApi, HttpBridgeApi};
use crate::blockchain::bridge::{SwapReceipt, TransactionBuilder, WithdrawReceipt, WithdrawRequest};
use crate::blockchain::provider::{LocalWalletProvider, WalletProvider};
use crate::blockchain::reader::ChainReaders;
use crate::core::config::BridgeConfig;
use crate::core::domain::{Asset, DepositMode, Network, RegisteredUser, SwapOrder};
use crate::core::errors::{BridgeError, Result};
use crate::core::validation::NATIVE_DECIMALS;
use crate::store::{AsyncCell, CachePolicy, FeeQuoteKey, FeeQuotes, LedgerStore};

pub struct BridgeService {
    config: Arc<BridgeConfig>,
    provider: Arc<dyn WalletProvider>,
    ledger: LedgerStore,
    fees: FeeQuotes,
    builder: TransactionBuilder,
    readers: Option<ChainReaders>,
}

impl BridgeService {
    pub fn new(
        config: BridgeConfig,
        api: Arc<dyn BridgeApi>,
        provider: Arc<dyn WalletProvider>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let policy = CachePolicy {
            retry_failed: config.ledger.fee_retry_failed,
            ttl: config.ledger.fee_ttl_secs.map(Duration::from_secs),
        };
        let ledger = LedgerStore::new(Arc::clone(&api), config.ledger.poll_interval());
        let fees = FeeQuotes::new(Arc::clone(&api), policy);
        let builder = TransactionBuilder::new(Arc::clone(&provider), api, Arc::clone(&config))?;
        Ok(Self { config, provider, ledger, fees, builder, readers: None })
    }

    /// HTTP API client, local key wallet and RPC readers from configuration.
    pub fn from_config(config: BridgeConfig, private_key: &str) -> Result<Self> {
        let api: Arc<dyn BridgeApi> = Arc::new(HttpBridgeApi::new(&config.api)?);
        let provider: Arc<dyn WalletProvider> =
            Arc::new(LocalWalletProvider::from_private_key(private_key)?);
        let readers = ChainReaders::connect(&config.networks)?;
        info!(
            mainnet = config.networks.mainnet.chain_id,
            mvm = config.networks.mvm.chain_id,
            "Bridge service configured"
        );
        Ok(Self::new(config, api, provider)?.with_readers(readers))
    }

    pub fn with_readers(mut self, readers: ChainReaders) -> Self {
        self.readers = Some(readers);
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    pub fn fees(&self) -> &FeeQuotes {
        &self.fees
    }

    pub fn builder(&self) -> &TransactionBuilder {
        &self.builder
    }

    pub fn sign_in(&self, user: RegisteredUser) {
        self.ledger.set_user(Some(user));
    }

    pub fn sign_out(&self) {
        self.ledger.set_user(None);
    }

    fn require_user(&self) -> Result<RegisteredUser> {
        self.ledger
            .user()
            .ok_or_else(|| BridgeError::Validation("No user signed in".to_string()))
    }

    fn require_asset(&self, asset_id: &str) -> Result<Asset> {
        self.ledger
            .get_asset(asset_id)
            .ok_or_else(|| BridgeError::InvalidAsset(format!("Unknown asset {}", asset_id)))
    }

    pub fn deposit_mode(&self, asset: &Asset) -> DepositMode {
        DepositMode::preferred_for(asset, &self.config.assets.source_native_asset_id)
    }

    /// Fee for withdrawing `asset` to `destination`, in units of the asset.
    pub fn fee_quote(&self, asset: &Asset, destination: &str) -> AsyncCell<Decimal> {
        self.fees.quote(FeeQuoteKey::new(&asset.asset_id, &asset.chain_id, destination))
    }

    /// Fee for withdrawing `asset`, in the native currency of its chain. This
    /// is what the fee leg of a withdrawal pays.
    pub fn native_fee_quote(&self, asset: &Asset, destination: &str) -> AsyncCell<Decimal> {
        self.fees.quote(FeeQuoteKey::new(&asset.chain_id, &asset.chain_id, destination))
    }

    /// Native or token balance of `account` on `network`.
    pub async fn balance(&self, account: &str, network: Network, contract: Option<&str>) -> Result<String> {
        let readers = self
            .readers
            .as_ref()
            .ok_or_else(|| BridgeError::Config("Chain readers are not configured".to_string()))?;
        let reader = readers.get(network);
        match contract {
            Some(contract) => reader.get_erc20_balance(account, contract).await,
            None => reader.get_balance(account, NATIVE_DECIMALS).await,
        }
    }

    pub async fn deposit(&self, asset_id: &str, amount: &str) -> Result<TxHash> {
        let asset = self.require_asset(asset_id)?;
        self.builder.deposit(&asset, amount).await
    }

    /// Withdraws from the signed-in user's contract. Without an explicit
    /// `fee` the quoted native fee is used.
    pub async fn withdraw(
        &self,
        asset_id: &str,
        amount: &str,
        destination: &str,
        tag: &str,
        fee: Option<&str>,
    ) -> Result<WithdrawReceipt> {
        let user = self.require_user()?;
        let asset = self.require_asset(asset_id)?;
        let fee = match fee {
            Some(fee) => fee.to_string(),
            None => self.native_fee_quote(&asset, destination).value().await?.normalize().to_string(),
        };
        let request = WithdrawRequest {
            asset,
            user_contract: user.contract,
            amount: amount.to_string(),
            destination: destination.to_string(),
            tag: tag.to_string(),
            fee,
        };
        self.builder.withdraw(&request).await
    }

    pub async fn swap(&self, order: &SwapOrder, min_received: &str) -> Result<SwapReceipt> {
        let user = self.require_user()?;
        let input = self.require_asset(&order.pay_asset_id)?;
        self.builder.swap(&user, order, &input, min_received).await
    }
}

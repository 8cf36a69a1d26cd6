//! Deposit, withdrawal and swap call sequences.

use ethers::abi::{AbiDecode, AbiEncode};
use ethers::types::{Address, Bytes, TransactionRequest, TxHash, U256};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::classifier::{classify, AssetShape, TransferDirection};
use super::extra::ExtraEncoder;
use crate::api::BridgeApi;
use crate::blockchain::contracts::{bridge::ReleaseCall, erc20, mvm_erc20::TransferWithExtraCall};
use crate::blockchain::network::ensure_network;
use crate::blockchain::provider::WalletProvider;
use crate::blockchain::signer::ChainSigner;
use crate::core::config::BridgeConfig;
use crate::core::domain::{ActionRequest, Asset, Network, RegisteredUser, SwapOrder};
use crate::core::errors::{BridgeError, Result};
use crate::core::validation::{
    is_zero_amount, parse_address, parse_amount, to_base_units, to_settlement_units, NATIVE_DECIMALS,
};
use crate::tools::async_support::AsyncPerformanceMonitor;
use crate::utils::hex_to_bytes;

/// Swap action opcode understood by the matching service.
const SWAP_ACTION_OPCODE: u8 = 3;

#[derive(Debug, Clone)]
pub struct WithdrawRequest {
    pub asset: Asset,
    /// The user's contract on the settlement chain
    pub user_contract: String,
    pub amount: String,
    /// Address on the asset's home chain receiving the funds
    pub destination: String,
    /// Destination memo or tag, may be empty
    pub tag: String,
    /// Fee in settlement native currency
    pub fee: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawReceipt {
    pub trace_id: Uuid,
    pub asset_tx: TxHash,
    pub fee_tx: TxHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReceipt {
    pub trace_id: Uuid,
    pub code: String,
    pub tx_hash: TxHash,
}

/// Builds and submits bridge transactions through a wallet provider.
///
/// Operations on one builder never interleave: each holds the operation
/// lock from the network switch until its last submission.
pub struct TransactionBuilder {
    provider: Arc<dyn WalletProvider>,
    api: Arc<dyn BridgeApi>,
    config: Arc<BridgeConfig>,
    encoder: ExtraEncoder,
    bridge_address: Address,
    op_lock: Mutex<()>,
}

impl TransactionBuilder {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        api: Arc<dyn BridgeApi>,
        config: Arc<BridgeConfig>,
    ) -> Result<Self> {
        let bridge_address = parse_address(&config.contracts.bridge_address)
            .map_err(|e| BridgeError::Config(format!("bridge_address: {}", e)))?;
        let encoder = ExtraEncoder::new(&config.contracts)?;
        Ok(Self { provider, api, config, encoder, bridge_address, op_lock: Mutex::new(()) })
    }

    pub fn encoder(&self) -> &ExtraEncoder {
        &self.encoder
    }

    /// Deposits `amount` of `asset` into the bridge from the source chain.
    pub async fn deposit(&self, asset: &Asset, amount: &str) -> Result<TxHash> {
        let shape = classify(asset, TransferDirection::Deposit, &self.config.assets)?;
        let destination = parse_address(&asset.destination)?;
        parse_amount(amount)?;

        let _guard = self.op_lock.lock().await;
        let monitor = AsyncPerformanceMonitor::start("deposit");
        ensure_network(self.provider.as_ref(), &self.config.networks, Network::Mainnet).await?;
        let signer = self.provider.signer().await?;

        let tx = match shape {
            AssetShape::SourceNative => TransactionRequest::new()
                .to(destination)
                .value(to_base_units(amount, NATIVE_DECIMALS)?)
                .chain_id(self.config.networks.mainnet.chain_id),
            AssetShape::SourceToken { token } => {
                let decimals = read_decimals(signer.as_ref(), token).await?;
                let value = to_base_units(amount, decimals)?;
                TransactionRequest::new()
                    .to(token)
                    .data(erc20::TransferCall { to: destination, value }.encode())
                    .gas(self.config.gas.deposit_token_gas_limit)
            }
            AssetShape::SettlementNative | AssetShape::SettlementToken { .. } => {
                return Err(BridgeError::InvalidAsset(format!(
                    "{} cannot be deposited from the source chain",
                    asset.asset_id
                )))
            }
        };

        let tx_hash = signer.send_transaction(tx).await?;
        info!(asset_id = %asset.asset_id, amount, tx_hash = ?tx_hash, "Deposit submitted");
        monitor.finish();
        Ok(tx_hash)
    }

    /// Withdraws an asset to its home chain: an asset leg followed by a fee leg.
    pub async fn withdraw(&self, request: &WithdrawRequest) -> Result<WithdrawReceipt> {
        let shape = classify(&request.asset, TransferDirection::Settlement, &self.config.assets)?;
        let receiver = parse_address(&request.user_contract)?;
        parse_amount(&request.amount)?;
        let fee_value = if is_zero_amount(&request.fee) {
            U256::zero()
        } else {
            to_settlement_units(&request.fee, NATIVE_DECIMALS)?
        };

        let trace_id = Uuid::new_v4();
        let extra = self.extra_bytes(&self.encoder.encode_withdrawal_extra(
            &request.destination,
            &request.tag,
            &trace_id,
        )?)?;

        let _guard = self.op_lock.lock().await;
        let monitor = AsyncPerformanceMonitor::start("withdraw");
        ensure_network(self.provider.as_ref(), &self.config.networks, Network::Mvm).await?;
        let signer = self.provider.signer().await?;

        let asset_tx = self
            .settlement_leg(signer.as_ref(), &shape, receiver, &request.amount, extra.clone())
            .await?;
        let asset_hash = signer.send_transaction(asset_tx).await?;
        info!(trace_id = %trace_id, leg = "asset", tx_hash = ?asset_hash, "Withdrawal leg submitted");

        let fee_tx = self.release(receiver, extra, fee_value);
        let fee_hash = signer.send_transaction(fee_tx).await?;
        info!(trace_id = %trace_id, leg = "fee", tx_hash = ?fee_hash, "Withdrawal leg submitted");

        monitor.finish();
        Ok(WithdrawReceipt { trace_id, asset_tx: asset_hash, fee_tx: fee_hash })
    }

    /// Settles a priced swap order: registers the action with the matching
    /// service, then sends the input asset with the returned memo.
    pub async fn swap(
        &self,
        user: &RegisteredUser,
        order: &SwapOrder,
        input_asset: &Asset,
        min_received: &str,
    ) -> Result<SwapReceipt> {
        let shape = classify(input_asset, TransferDirection::Settlement, &self.config.assets)?;
        if input_asset.asset_id != order.pay_asset_id {
            return Err(BridgeError::Validation(format!(
                "Order pays {} but input asset is {}",
                order.pay_asset_id, input_asset.asset_id
            )));
        }
        let receiver = parse_address(&user.contract)?;
        parse_amount(&order.funds)?;
        parse_amount(min_received)?;

        let _guard = self.op_lock.lock().await;
        let monitor = AsyncPerformanceMonitor::start("swap");

        let trace_id = Uuid::new_v4();
        let action = format!(
            "{},{},{},{},{},{}",
            SWAP_ACTION_OPCODE, user.user_id, trace_id, order.fill_asset_id, order.routes, min_received
        );
        debug!(trace_id = %trace_id, action = %action, "Creating swap action");
        let created = self
            .api
            .create_action(
                &ActionRequest {
                    action,
                    amount: order.funds.clone(),
                    asset_id: order.pay_asset_id.clone(),
                    broker_id: String::new(),
                },
                user,
            )
            .await?;
        let code = self.api.fetch_code(&created.code).await?;
        let extra = self.extra_bytes(&self.encoder.encode_swap_extra(&code)?)?;

        ensure_network(self.provider.as_ref(), &self.config.networks, Network::Mvm).await?;
        let signer = self.provider.signer().await?;
        let tx = self.settlement_leg(signer.as_ref(), &shape, receiver, &order.funds, extra).await?;
        let tx_hash = signer.send_transaction(tx).await?;
        info!(trace_id = %trace_id, code = %created.code, tx_hash = ?tx_hash, "Swap submitted");

        monitor.finish();
        Ok(SwapReceipt { trace_id, code: created.code, tx_hash })
    }

    /// The value-carrying settlement call for a classified asset.
    async fn settlement_leg(
        &self,
        signer: &dyn ChainSigner,
        shape: &AssetShape,
        receiver: Address,
        amount: &str,
        extra: Bytes,
    ) -> Result<TransactionRequest> {
        match shape {
            AssetShape::SettlementNative => {
                let value = to_settlement_units(amount, NATIVE_DECIMALS)?;
                Ok(self.release(receiver, extra, value))
            }
            AssetShape::SettlementToken { contract } => {
                let decimals = read_decimals(signer, *contract).await?;
                let value = to_settlement_units(amount, decimals)?;
                let data = TransferWithExtraCall { to: receiver, value, extra }.encode();
                Ok(self.settlement_call(*contract, data, U256::zero()))
            }
            AssetShape::SourceNative | AssetShape::SourceToken { .. } => {
                Err(BridgeError::InvalidAsset("asset is not settled on the bridge chain".to_string()))
            }
        }
    }

    fn release(&self, receiver: Address, input: Bytes, value: U256) -> TransactionRequest {
        let data = ReleaseCall { receiver, input }.encode();
        self.settlement_call(self.bridge_address, data, value)
    }

    fn settlement_call(&self, to: Address, data: Vec<u8>, value: U256) -> TransactionRequest {
        TransactionRequest::new()
            .to(to)
            .data(data)
            .value(value)
            .gas(self.config.gas.settlement_gas_limit)
            .gas_price(self.config.gas.settlement_gas_price)
    }

    fn extra_bytes(&self, extra: &str) -> Result<Bytes> {
        Ok(Bytes::from(hex_to_bytes(extra)?))
    }
}

async fn read_decimals(signer: &dyn ChainSigner, token: Address) -> Result<u32> {
    let raw = signer.call(token, erc20::DecimalsCall.encode().into()).await?;
    let decoded = erc20::DecimalsReturn::decode(raw.as_ref())
        .map_err(|e| BridgeError::Blockchain(format!("Bad decimals() result from {:?}: {}", token, e)))?;
    Ok(u32::from(decoded.0))
}

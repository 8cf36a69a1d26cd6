//! Client side of the bridge's external read and action API.

pub mod client;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::core::domain::{
    ActionRequest, ActionResponse, Asset, CodeResponse, ExchangeRate, Pair, RegisteredUser,
};
use crate::core::errors::Result;

pub use client::HttpBridgeApi;

#[async_trait]
pub trait BridgeApi: Send + Sync {
    /// Assets with balances of `user`.
    async fn fetch_assets(&self, user: &RegisteredUser) -> Result<Vec<Asset>>;

    async fn fetch_pairs(&self) -> Result<Vec<Pair>>;

    async fn fetch_exchange_rates(&self) -> Result<Vec<ExchangeRate>>;

    /// Withdrawal fee, denominated in the fee asset of the asset's chain.
    async fn fetch_withdrawal_fee(&self, asset_id: &str, destination: &str) -> Result<Decimal>;

    /// Converts `fee` (in the chain asset) into units of `asset_id`.
    async fn fetch_fee_on_asset(&self, asset_id: &str, chain_id: &str, fee: Decimal) -> Result<Decimal>;

    async fn create_action(&self, request: &ActionRequest, user: &RegisteredUser) -> Result<ActionResponse>;

    async fn fetch_code(&self, code: &str) -> Result<CodeResponse>;
}

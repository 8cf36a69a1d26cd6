use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

use super::cache::{AsyncCell, CachePolicy, KeyedAsyncCache};
use crate::api::BridgeApi;
use crate::core::errors::Result;

/// Structural key of a withdrawal fee quote.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeeQuoteKey {
    pub asset_id: String,
    pub chain_id: String,
    pub destination: String,
}

impl FeeQuoteKey {
    pub fn new(asset_id: impl Into<String>, chain_id: impl Into<String>, destination: impl Into<String>) -> Self {
        Self { asset_id: asset_id.into(), chain_id: chain_id.into(), destination: destination.into() }
    }
}

/// Withdrawal fee quotes, one shared fetch per (asset, chain, destination).
pub struct FeeQuotes {
    api: Arc<dyn BridgeApi>,
    cache: KeyedAsyncCache<FeeQuoteKey, Decimal>,
}

impl FeeQuotes {
    pub fn new(api: Arc<dyn BridgeApi>, policy: CachePolicy) -> Self {
        Self { api, cache: KeyedAsyncCache::new(policy) }
    }

    pub fn quote(&self, key: FeeQuoteKey) -> AsyncCell<Decimal> {
        let api = Arc::clone(&self.api);
        self.cache.get(key, move |key| {
            let key = key.clone();
            async move { withdrawal_fee(api.as_ref(), &key).await }
        })
    }

    pub fn cache(&self) -> &KeyedAsyncCache<FeeQuoteKey, Decimal> {
        &self.cache
    }
}

/// Fee in units of the asset being withdrawn. Chain-native assets and free
/// withdrawals need no conversion.
async fn withdrawal_fee(api: &dyn BridgeApi, key: &FeeQuoteKey) -> Result<Decimal> {
    let fee = api.fetch_withdrawal_fee(&key.asset_id, &key.destination).await?;
    if fee.is_zero() || key.asset_id == key.chain_id {
        return Ok(fee);
    }
    let converted = api.fetch_fee_on_asset(&key.asset_id, &key.chain_id, fee).await?;
    debug!(asset_id = %key.asset_id, %fee, %converted, "Converted withdrawal fee");
    Ok(converted)
}

//! Decides which on-chain call sequence an asset needs.

use ethers::types::Address;

use crate::core::config::AssetIdsConfig;
use crate::core::domain::Asset;
use crate::core::errors::{BridgeError, Result};
use crate::core::validation::parse_address;

/// Which leg of the bridge an asset is being moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Into the bridge, on the source chain.
    Deposit,
    /// Out of or through the bridge, on the settlement chain.
    Settlement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetShape {
    /// Source chain native currency: plain value transfer.
    SourceNative,
    /// Token on the source chain, moved with `transfer` on `token`.
    SourceToken { token: Address },
    /// Settlement chain native currency: value sent through `release`.
    SettlementNative,
    /// Settlement chain token, moved with `transferWithExtra` on `contract`.
    SettlementToken { contract: Address },
}

impl AssetShape {
    /// Whether the asset moves as native value (no token contract involved).
    pub fn is_native(&self) -> bool {
        matches!(self, AssetShape::SourceNative | AssetShape::SettlementNative)
    }
}

pub fn classify(asset: &Asset, direction: TransferDirection, ids: &AssetIdsConfig) -> Result<AssetShape> {
    match direction {
        TransferDirection::Deposit => {
            let native = &ids.source_native_asset_id;
            if asset.asset_id == *native {
                Ok(AssetShape::SourceNative)
            } else if asset.chain_id == *native && !asset.asset_key.is_empty() {
                let token = parse_address(&asset.asset_key).map_err(|_| invalid(asset))?;
                Ok(AssetShape::SourceToken { token })
            } else {
                Err(invalid(asset))
            }
        }
        TransferDirection::Settlement => {
            let native = &ids.settlement_native_asset_id;
            if asset.asset_id == *native {
                return Ok(AssetShape::SettlementNative);
            }
            match asset.contract.as_deref() {
                Some(contract) if asset.chain_id == *native => {
                    let contract = parse_address(contract).map_err(|_| invalid(asset))?;
                    Ok(AssetShape::SettlementToken { contract })
                }
                _ => Err(invalid(asset)),
            }
        }
    }
}

fn invalid(asset: &Asset) -> BridgeError {
    BridgeError::InvalidAsset(format!(
        "{} ({}) on chain {} is not supported",
        asset.symbol, asset.asset_id, asset.chain_id
    ))
}

//! Bridge domain records
//!
//! Payloads coming from the external API are parsed into these typed records
//! at the boundary; decimal fields are validated once here.

use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two chains the bridge spans.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Public source chain (Ethereum mainnet)
    Mainnet,
    /// Settlement chain
    Mvm,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Mvm => write!(f, "mvm"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "eth" | "ethereum" => Ok(Network::Mainnet),
            "mvm" => Ok(Network::Mvm),
            other => Err(format!("Unsupported network: {}", other)),
        }
    }
}

/// A transferable value type as listed by the bridge API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Asset {
    pub asset_id: String,
    pub chain_id: String,
    /// Token contract on the settlement chain, if any
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub contract: Option<String>,
    /// Token contract on the source chain
    #[serde(default)]
    pub asset_key: String,
    /// Bridge deposit address on the source chain
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    pub balance: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_or_zero")]
    pub price_usd: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal_or_zero")]
    pub price_btc: Decimal,
}

/// How a deposit for an asset is best performed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DepositMode {
    /// Sign a transfer with the connected wallet
    Wallet,
    /// Show the deposit address for a manual transfer
    QrCode,
}

impl DepositMode {
    /// Assets living on the source chain can be deposited from the wallet.
    pub fn preferred_for(asset: &Asset, source_native_asset_id: &str) -> Self {
        if asset.asset_id == source_native_asset_id || asset.chain_id == source_native_asset_id {
            DepositMode::Wallet
        } else {
            DepositMode::QrCode
        }
    }
}

/// A user registered with the bridge.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisteredUser {
    pub user_id: String,
    /// The user's contract on the settlement chain
    pub contract: String,
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

impl fmt::Debug for RegisteredUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredUser")
            .field("user_id", &self.user_id)
            .field("contract", &self.contract)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// A trading pair from the swap service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pair {
    pub base_asset_id: String,
    pub quote_asset_id: String,
    #[serde(default, deserialize_with = "deserialize_decimal_or_zero")]
    pub base_amount: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal_or_zero")]
    pub quote_amount: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal_or_zero")]
    pub fee_percent: Decimal,
    #[serde(default)]
    pub route_id: i64,
}

/// Fiat exchange rate against USD.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExchangeRate {
    pub code: String,
    #[serde(deserialize_with = "deserialize_decimal_or_zero")]
    pub rate: Decimal,
}

/// A priced swap order as returned by the swap service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwapOrder {
    pub pay_asset_id: String,
    pub fill_asset_id: String,
    /// Input amount paid
    pub funds: String,
    /// Expected output amount
    #[serde(default)]
    pub amount: String,
    /// Route string understood by the swap engine
    pub routes: String,
}

/// Body of an off-chain action creation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionRequest {
    pub action: String,
    pub amount: String,
    pub asset_id: String,
    pub broker_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionResponse {
    pub code: String,
}

/// Receiver set resolved from an action code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeResponse {
    pub receivers: Vec<String>,
    pub threshold: u32,
    pub memo: String,
}

fn deserialize_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

/// Accepts a decimal as string or number; null, missing and "" map to `None`.
fn deserialize_opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => Decimal::from_str(s.trim())
            .or_else(|_| Decimal::from_scientific(s.trim()))
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid decimal '{}': {}", s, e))),
        Some(serde_json::Value::Number(n)) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid decimal {}: {}", n, e))),
        Some(other) => Err(de::Error::custom(format!("expected decimal, got {}", other))),
    }
}

/// Like the optional form, but the value must be present.
pub(crate) fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_opt_decimal(deserializer)?.ok_or_else(|| de::Error::custom("missing decimal"))
}

fn deserialize_decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_opt_decimal(deserializer)?.unwrap_or_default())
}

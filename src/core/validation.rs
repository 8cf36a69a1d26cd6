use ethers::types::{Address, U256};
use ethers::utils::parse_units;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use sha3::{Digest, Keccak256};
use std::str::FromStr;

use super::errors::{BridgeError, Result};

/// Fractional digits kept on settlement-chain amounts before unit conversion.
pub const SETTLEMENT_AMOUNT_DECIMALS: u32 = 8;

/// Decimals of the native currency on both chains.
pub const NATIVE_DECIMALS: u32 = 18;

/// Validates an Ethereum address.
pub fn validate_ethereum_address(address: &str) -> Result<()> {
    if !address.starts_with("0x") || address.len() != 42 {
        return Err(BridgeError::Validation("Invalid Ethereum address format".to_string()));
    }
    let hex_regex =
        Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("Hardcoded regex should always compile");
    if !hex_regex.is_match(address) {
        return Err(BridgeError::Validation("Invalid Ethereum address characters".to_string()));
    }
    // EIP-55: if mixed-case, enforce checksum. All-lower or all-upper acceptable for compatibility.
    let body = &address[2..];
    let is_all_lower = body.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
    let is_all_upper = body.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase());
    if is_all_lower || is_all_upper {
        return Ok(());
    }
    if !is_eip55_checksum_valid(address) {
        return Err(BridgeError::Validation(
            "Invalid EIP-55 checksum for Ethereum address".to_string(),
        ));
    }
    Ok(())
}

fn is_eip55_checksum_valid(addr: &str) -> bool {
    let body = &addr[2..];
    let lower = body.to_lowercase();
    let mut keccak = Keccak256::new();
    keccak.update(lower.as_bytes());
    let hash = keccak.finalize();
    for (i, ch) in body.chars().enumerate() {
        let nibble = (hash[i / 2] >> (4 * (1 - (i % 2)))) & 0x0f;
        match ch {
            'a'..='f' if nibble >= 8 => return false,
            'A'..='F' if nibble < 8 => return false,
            _ => {}
        }
    }
    true
}

/// Parses and validates an address into its `ethers` form.
pub fn parse_address(address: &str) -> Result<Address> {
    validate_ethereum_address(address)?;
    Address::from_str(address)
        .map_err(|e| BridgeError::Validation(format!("Invalid address {}: {}", address, e)))
}

/// Parses a strictly positive decimal amount. No exponent, no sign.
pub fn parse_amount(amount: &str) -> Result<Decimal> {
    let trimmed = amount.trim();
    let re = Regex::new(r"^(?:0|[1-9]\d*)(?:\.\d+)?$")
        .expect("Decimal regex pattern should always be valid");
    if !re.is_match(trimmed) {
        return Err(BridgeError::InvalidAmount(format!("Malformed amount '{}'", amount)));
    }
    let value = Decimal::from_str(trimmed)
        .map_err(|e| BridgeError::InvalidAmount(format!("Malformed amount '{}': {}", amount, e)))?;
    if value.is_zero() {
        return Err(BridgeError::InvalidAmount("Amount must be positive".to_string()));
    }
    Ok(value)
}

/// True for a well-formed zero such as `0` or `0.000`.
pub fn is_zero_amount(amount: &str) -> bool {
    let re = Regex::new(r"^0(?:\.0+)?$").expect("Zero regex pattern should always be valid");
    re.is_match(amount.trim())
}

/// Rounds an amount half away from zero to `decimals` fractional digits.
pub fn round_amount(amount: Decimal, decimals: u32) -> Decimal {
    amount.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero).normalize()
}

/// Converts an exact decimal amount into base units. Fails instead of truncating
/// when the amount carries more fractional digits than `decimals`.
pub fn to_base_units(amount: &str, decimals: u32) -> Result<U256> {
    let value = parse_amount(amount)?.normalize();
    if value.scale() > decimals {
        return Err(BridgeError::InvalidAmount(format!(
            "Amount '{}' has more than {} fractional digits",
            amount, decimals
        )));
    }
    let units = parse_units(value.to_string(), decimals)?;
    Ok(units.into())
}

/// Converts a settlement-chain amount: rounded to at most eight fractional
/// digits (fewer when the token has fewer decimals), then into base units.
pub fn to_settlement_units(amount: &str, decimals: u32) -> Result<U256> {
    let value = parse_amount(amount)?;
    let rounded = round_amount(value, SETTLEMENT_AMOUNT_DECIMALS.min(decimals));
    if rounded.is_zero() {
        return Err(BridgeError::InvalidAmount(format!(
            "Amount '{}' rounds to zero at {} decimals",
            amount, decimals
        )));
    }
    let units = parse_units(rounded.to_string(), decimals)?;
    Ok(units.into())
}

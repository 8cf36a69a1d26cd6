// src/utils.rs
use crate::core::errors::{BridgeError, Result};

/// Removes a leading `0x`/`0X`, if present.
pub fn strip_0x(value: &str) -> &str {
    value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")).unwrap_or(value)
}

/// Chain id in the `0x`-prefixed lowercase hex form wallets expect.
pub fn to_hex_chain_id(chain_id: u64) -> String {
    format!("0x{:x}", chain_id)
}

pub fn parse_hex_chain_id(value: &str) -> Option<u64> {
    u64::from_str_radix(strip_0x(value.trim()), 16).ok()
}

/// Convert a hex-encoded string (optionally `0x`-prefixed) to bytes.
pub fn hex_to_bytes(hex_string: &str) -> Result<Vec<u8>> {
    let body = strip_0x(hex_string.trim());
    if body.is_empty() {
        return Err(BridgeError::Validation("Hex string cannot be empty".to_string()));
    }
    hex::decode(body).map_err(|e| BridgeError::Validation(format!("Invalid hex string: {}", e)))
}

/// Convert bytes to a lowercase hex string without prefix.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

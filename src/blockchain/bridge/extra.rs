//! Extra payloads attached to settlement-chain calls so the bridge
//! watcher can attribute released funds.
//!
//! Layout: `0x ‖ registry pid ‖ storage address ‖ [keccak digest] ‖ hex(action JSON)`.

use serde::Serialize;
use sha3::{Digest, Keccak256};
use uuid::Uuid;

use crate::core::config::ContractsConfig;
use crate::core::domain::CodeResponse;
use crate::core::errors::{BridgeError, Result};
use crate::utils::{bytes_to_hex, strip_0x};

#[derive(Serialize)]
struct WithdrawalMemo<'a> {
    destination: &'a str,
    tag: &'a str,
    amount: String,
}

#[derive(Serialize)]
struct Action<'a> {
    receivers: &'a [String],
    threshold: u32,
    extra: String,
}

#[derive(Debug, Clone)]
pub struct ExtraEncoder {
    registry_pid: String,
    storage_address: String,
    withdrawal_bot: String,
}

impl ExtraEncoder {
    /// Fails when no withdrawal bot is configured: a payload without a
    /// receiver cannot be routed by the watcher.
    pub fn new(contracts: &ContractsConfig) -> Result<Self> {
        let withdrawal_bot = contracts.withdrawal_bot.trim();
        if withdrawal_bot.is_empty() {
            return Err(BridgeError::Config("withdrawal_bot must be set".to_string()));
        }
        Ok(Self {
            registry_pid: strip_0x(&contracts.registry_pid).replace('-', "").to_lowercase(),
            storage_address: strip_0x(&contracts.storage_address).to_lowercase(),
            withdrawal_bot: withdrawal_bot.to_string(),
        })
    }

    fn prefix(&self) -> String {
        format!("0x{}{}", self.registry_pid, self.storage_address)
    }

    /// Payload for a withdrawal to `destination` (with optional `tag`).
    /// Both legs of one withdrawal carry the same payload, so the watcher
    /// attributes them to the same `trace_id`.
    pub fn encode_withdrawal_extra(&self, destination: &str, tag: &str, trace_id: &Uuid) -> Result<String> {
        let memo = WithdrawalMemo { destination, tag, amount: trace_id.to_string() };
        let receivers = [self.withdrawal_bot.clone()];
        let action = Action { receivers: &receivers, threshold: 1, extra: serde_json::to_string(&memo)? };
        let action_json = serde_json::to_string(&action)?;

        let digest = Keccak256::digest(action_json.as_bytes());
        Ok(format!("{}{}{}", self.prefix(), bytes_to_hex(&digest), bytes_to_hex(action_json.as_bytes())))
    }

    /// Payload for a swap settlement. The memo comes from the swap service,
    /// so no digest is prepended.
    pub fn encode_swap_extra(&self, code: &CodeResponse) -> Result<String> {
        let action =
            Action { receivers: &code.receivers, threshold: code.threshold, extra: code.memo.clone() };
        let action_json = serde_json::to_string(&action)?;
        Ok(format!("{}{}", self.prefix(), bytes_to_hex(action_json.as_bytes())))
    }
}

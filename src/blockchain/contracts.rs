//! Typed bindings for the contracts the bridge talks to.
//!
//! Each binding lives in its own module so the generated call structs
//! (`DecimalsCall`, `TransferCall`, ...) do not collide.

pub mod bridge {
    ethers::contract::abigen!(
        BridgeContract,
        r#"[
            function release(address receiver, bytes input) external payable
        ]"#
    );
}

pub mod erc20 {
    ethers::contract::abigen!(
        Erc20Token,
        r#"[
            function decimals() external view returns (uint8)
            function balanceOf(address account) external view returns (uint256)
            function transfer(address to, uint256 value) external returns (bool)
        ]"#
    );
}

/// Settlement-chain token with the bridge-specific transfer entry point.
pub mod mvm_erc20 {
    ethers::contract::abigen!(
        MvmErc20Token,
        r#"[
            function decimals() external view returns (uint8)
            function transferWithExtra(address to, uint256 value, bytes extra) external returns (bool)
        ]"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::AbiEncode;
    use ethers::types::{Address, Bytes, U256};

    #[test]
    fn test_transfer_selector() {
        let data = erc20::TransferCall { to: Address::zero(), value: U256::from(1u64) }.encode();
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 4 + 64);
    }

    #[test]
    fn test_decimals_selector() {
        let data = erc20::DecimalsCall.encode();
        assert_eq!(data, vec![0x31, 0x3c, 0xe5, 0x67]);
    }

    #[test]
    fn test_release_encodes_dynamic_bytes() {
        let call = bridge::ReleaseCall {
            receiver: Address::repeat_byte(0x11),
            input: Bytes::from(vec![0xab; 40]),
        };
        let data = call.encode();
        // selector + address + offset + length + two padded words
        assert_eq!(data.len(), 4 + 32 * 5);
        assert_eq!(&data[4 + 12..4 + 32], Address::repeat_byte(0x11).as_bytes());
    }
}

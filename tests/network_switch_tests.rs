//! tests/network_switch_tests.rs

mod common;

use common::*;
use mvm_bridge_wallet::blockchain::network::ensure_network;
use mvm_bridge_wallet::blockchain::provider::{
    LocalWalletProvider, ProviderRpcError, WalletProvider, ADD_CHAIN_METHOD, SWITCH_CHAIN_METHOD,
};
use mvm_bridge_wallet::core::domain::Network;
use mvm_bridge_wallet::BridgeError;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_known_chain_switches_once() {
    let provider = RecordingProvider::connected();
    ensure_network(provider.as_ref(), &config().networks, Network::Mvm).await.unwrap();
    assert_eq!(provider.methods(), vec![SWITCH_CHAIN_METHOD.to_string()]);
}

#[tokio::test]
async fn test_unknown_chain_is_added_without_second_switch() {
    let provider = RecordingProvider::new(&["0x1"]);
    ensure_network(provider.as_ref(), &config().networks, Network::Mvm).await.unwrap();

    assert_eq!(
        provider.methods(),
        vec![SWITCH_CHAIN_METHOD.to_string(), ADD_CHAIN_METHOD.to_string()]
    );
    let (_, params) = &provider.requests()[1];
    assert_eq!(params[0]["chainId"], "0x120c7");
    assert_eq!(params[0]["chainName"], "Mixin Virtual Machine");
    assert_eq!(params[0]["rpcUrls"][0], "https://geth.mvm.dev");
    assert_eq!(params[0]["nativeCurrency"]["symbol"], "ETH");
}

#[tokio::test]
async fn test_rejected_switch_propagates() {
    let provider = RecordingProvider::connected();
    provider.fail_switch_with(ProviderRpcError::new(ProviderRpcError::USER_REJECTED, "User rejected"));

    let result = ensure_network(provider.as_ref(), &config().networks, Network::Mainnet).await;

    assert!(matches!(result, Err(BridgeError::Provider(_))));
    assert_eq!(provider.methods(), vec![SWITCH_CHAIN_METHOD.to_string()]);
}

#[tokio::test]
async fn test_missing_capability_is_fatal() {
    let provider = RecordingProvider::connected();
    provider.fail_switch_with(ProviderRpcError::unsupported_method(SWITCH_CHAIN_METHOD));

    let err = ensure_network(provider.as_ref(), &config().networks, Network::Mvm).await.unwrap_err();
    assert!(err.to_string().contains("cannot switch networks"));
}

#[tokio::test]
async fn test_local_wallet_learns_chain_through_add() {
    // Hardhat account #0
    let wallet = LocalWalletProvider::from_private_key(
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    )
    .unwrap();
    let networks = config().networks;

    ensure_network(&wallet, &networks, Network::Mvm).await.unwrap();
    assert_eq!(wallet.active_chain_id(), Some(73927));

    ensure_network(&wallet, &networks, Network::Mvm).await.unwrap();
    assert!(wallet.knows_chain(73927));
    assert!(wallet.signer().await.is_ok());
}

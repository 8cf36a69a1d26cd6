//! tests/ledger_store_tests.rs
//!
//! Polling lifecycle and derived totals. Timers run on paused Tokio time.

mod common;

use common::*;
use mvm_bridge_wallet::store::LedgerStore;
use mvm_bridge_wallet::BridgeError;
use std::sync::atomic::Ordering;
use std::time::Duration;

const POLL: Duration = Duration::from_secs(15);

/// Lets paused time run just past the next poll tick.
async fn next_tick() {
    tokio::time::sleep(POLL + Duration::from_millis(100)).await;
}

#[tokio::test(start_paused = true)]
async fn test_polling_runs_only_while_subscribed() {
    let api = MockApi::new();
    let store = LedgerStore::new(api.clone(), POLL);
    store.set_user(Some(user()));

    assert!(!store.assets().is_polling());
    let subscription = store.assets().subscribe();
    assert!(store.assets().is_polling());

    next_tick().await;
    assert_eq!(api.asset_fetches.load(Ordering::SeqCst), 1);
    assert_eq!(subscription.current().len(), 2);

    drop(subscription);
    assert!(!store.assets().is_polling());
    next_tick().await;
    next_tick().await;
    assert_eq!(api.asset_fetches.load(Ordering::SeqCst), 1);

    let _again = store.assets().subscribe();
    next_tick().await;
    assert_eq!(api.asset_fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_timer_stops_after_last_of_many_subscribers() {
    let api = MockApi::new();
    let store = LedgerStore::new(api.clone(), POLL);

    let first = store.pairs().subscribe();
    let second = store.pairs().subscribe();
    assert_eq!(store.pairs().subscriber_count(), 2);

    drop(first);
    assert!(store.pairs().is_polling());
    next_tick().await;
    assert_eq!(api.pair_fetches.load(Ordering::SeqCst), 1);

    drop(second);
    assert!(!store.pairs().is_polling());
}

#[tokio::test(start_paused = true)]
async fn test_asset_ticks_skip_without_user() {
    let api = MockApi::new();
    let store = LedgerStore::new(api.clone(), POLL);

    let _subscription = store.assets().subscribe();
    next_tick().await;
    assert_eq!(api.asset_fetches.load(Ordering::SeqCst), 0);
    assert!(store.assets().get().is_empty());

    store.set_user(Some(user()));
    next_tick().await;
    assert_eq!(api.asset_fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_tick_keeps_previous_value() {
    let api = MockApi::new();
    let store = LedgerStore::new(api.clone(), POLL);
    store.set_user(Some(user()));
    store.update_assets().await.unwrap();

    api.set_assets(Err(BridgeError::Network("connection reset".into())));
    let _subscription = store.assets().subscribe();
    next_tick().await;

    assert_eq!(api.asset_fetches.load(Ordering::SeqCst), 2);
    assert_eq!(store.assets().get().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_subscriber_sees_changes() {
    let api = MockApi::new();
    let store = LedgerStore::new(api.clone(), POLL);
    store.set_user(Some(user()));

    let mut subscription = store.assets().subscribe();
    let assets = subscription.changed().await.unwrap();
    assert_eq!(assets[0].asset_id, ETH);
}

#[tokio::test]
async fn test_totals_are_exact_decimals() {
    let api = MockApi::new();
    let store = LedgerStore::new(api.clone(), POLL);
    assert_eq!(store.total_balance_usd(), None);

    store.set_user(Some(user()));
    store.update_assets().await.unwrap();

    // 2 × 3 + 1 × 5
    assert_eq!(store.total_balance_usd().unwrap().to_string(), "11");
    // 2 × 0.05 + 1 × 0.0001
    assert_eq!(store.total_balance_btc().unwrap().normalize().to_string(), "0.1001");
}

#[tokio::test]
async fn test_update_assets_without_user_is_noop() {
    let api = MockApi::new();
    let store = LedgerStore::new(api.clone(), POLL);

    store.update_assets().await.unwrap();

    assert_eq!(api.asset_fetches.load(Ordering::SeqCst), 0);
    assert_eq!(store.total_balance_usd(), None);
}

#[tokio::test]
async fn test_get_asset_and_exchange_rates() {
    let api = MockApi::new();
    let store = LedgerStore::new(api.clone(), POLL);
    store.set_user(Some(user()));
    store.update_assets().await.unwrap();

    assert_eq!(store.get_asset(USDT).unwrap().symbol, "USDT");
    assert!(store.get_asset("").is_none());
    assert!(store.get_asset(BTC).is_none());

    store.refresh_exchange_rates().await.unwrap();
    assert_eq!(store.exchange_rates()[0].code, "EUR");
}

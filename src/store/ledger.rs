//! Live ledger state: polled asset and pair lists, exchange rates and the
//! totals derived from balances.

use futures::future::{BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::BridgeApi;
use crate::core::domain::{Asset, ExchangeRate, Pair, RegisteredUser};
use crate::core::errors::{BridgeError, Result};
use crate::tools::async_support::{AsyncExecutor, TimeoutConfig};

/// Produces a fresh value for a polled container. `Ok(None)` skips the tick.
pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<Option<T>>> + Send + Sync>;

#[derive(Default)]
struct PollState {
    subscribers: usize,
    task: Option<JoinHandle<()>>,
}

struct ContainerInner<T> {
    name: &'static str,
    sender: watch::Sender<T>,
    fetch: Fetcher<T>,
    interval: Duration,
    state: Mutex<PollState>,
}

impl<T> ContainerInner<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Replaces the value; observers are notified only on an actual change.
    fn publish(&self, value: T) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }

    async fn tick(&self) {
        let fetch = (self.fetch)();
        let timeout = TimeoutConfig::new(self.interval.max(Duration::from_secs(5)), self.name);
        match AsyncExecutor::execute_with_timeout(fetch, timeout).await {
            Ok(Some(value)) => {
                let changed = self.publish(value);
                debug!(container = self.name, changed, "Poll tick");
            }
            Ok(None) => debug!(container = self.name, "Poll tick skipped"),
            Err(e) => warn!(container = self.name, error = %e, "Poll tick failed, keeping previous value"),
        }
    }
}

/// A value refreshed on a fixed interval while anyone is subscribed.
///
/// The first [`subscribe`](Self::subscribe) starts the timer; dropping the
/// last [`Subscription`] aborts it.
pub struct PolledContainer<T> {
    inner: Arc<ContainerInner<T>>,
}

impl<T> Clone for PolledContainer<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> PolledContainer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(name: &'static str, initial: T, interval: Duration, fetch: Fetcher<T>) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            inner: Arc::new(ContainerInner {
                name,
                sender,
                fetch,
                interval,
                state: Mutex::new(PollState::default()),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.sender.borrow().clone()
    }

    pub fn set(&self, value: T) -> bool {
        self.inner.publish(value)
    }

    /// Runs one fetch now, outside the timer.
    pub async fn refresh(&self) -> Result<bool> {
        match (self.inner.fetch)().await? {
            Some(value) => Ok(self.inner.publish(value)),
            None => Ok(false),
        }
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let mut state = self.inner.state.lock();
        state.subscribers += 1;
        if state.task.is_none() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let weak = Arc::downgrade(&self.inner);
                    state.task = Some(handle.spawn(poll_loop(weak, self.inner.interval)));
                    info!(container = self.inner.name, interval = ?self.inner.interval, "Polling started");
                }
                Err(_) => warn!(container = self.inner.name, "No Tokio runtime, polling disabled"),
            }
        }
        Subscription { receiver: self.inner.sender.subscribe(), inner: Arc::clone(&self.inner) }
    }

    pub fn is_polling(&self) -> bool {
        self.inner.state.lock().task.is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers
    }
}

async fn poll_loop<T>(inner: Weak<ContainerInner<T>>, period: Duration)
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(container) = inner.upgrade() else { break };
        container.tick().await;
    }
}

/// Keeps its container polling while alive.
pub struct Subscription<T> {
    receiver: watch::Receiver<T>,
    inner: Arc<ContainerInner<T>>,
}

impl<T: Clone> Subscription<T> {
    pub fn current(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Waits for the next published change.
    pub async fn changed(&mut self) -> Result<T> {
        self.receiver
            .changed()
            .await
            .map_err(|_| BridgeError::Config(format!("{} container closed", self.inner.name)))?;
        Ok(self.receiver.borrow_and_update().clone())
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        state.subscribers = state.subscribers.saturating_sub(1);
        if state.subscribers == 0 {
            if let Some(task) = state.task.take() {
                task.abort();
                info!(container = self.inner.name, "Polling stopped");
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceKind {
    Usd,
    Btc,
}

/// Σ balance × price over assets with a known balance. `None` for an empty
/// list or when the sum overflows the decimal range.
pub fn total_value(assets: &[Asset], kind: PriceKind) -> Option<Decimal> {
    if assets.is_empty() {
        return None;
    }
    let mut total = Decimal::ZERO;
    for asset in assets {
        let Some(balance) = asset.balance else { continue };
        let price = match kind {
            PriceKind::Usd => asset.price_usd,
            PriceKind::Btc => asset.price_btc,
        };
        match balance.checked_mul(price).and_then(|value| total.checked_add(value)) {
            Some(sum) => total = sum,
            None => {
                warn!(asset_id = %asset.asset_id, ?kind, "Total value overflowed");
                return None;
            }
        }
    }
    Some(total)
}

pub struct LedgerStore {
    api: Arc<dyn BridgeApi>,
    user: Arc<RwLock<Option<RegisteredUser>>>,
    assets: PolledContainer<Vec<Asset>>,
    pairs: PolledContainer<Vec<Pair>>,
    exchange_rates: watch::Sender<Vec<ExchangeRate>>,
}

impl LedgerStore {
    pub fn new(api: Arc<dyn BridgeApi>, poll_interval: Duration) -> Self {
        let user: Arc<RwLock<Option<RegisteredUser>>> = Arc::new(RwLock::new(None));

        let assets_fetch: Fetcher<Vec<Asset>> = {
            let api = Arc::clone(&api);
            let user = Arc::clone(&user);
            Arc::new(move || {
                let api = Arc::clone(&api);
                let current = user.read().clone();
                async move {
                    match current {
                        Some(user) => api.fetch_assets(&user).await.map(Some),
                        None => Ok(None),
                    }
                }
                .boxed()
            })
        };
        let pairs_fetch: Fetcher<Vec<Pair>> = {
            let api = Arc::clone(&api);
            Arc::new(move || {
                let api = Arc::clone(&api);
                async move { api.fetch_pairs().await.map(Some) }.boxed()
            })
        };
        let (exchange_rates, _) = watch::channel(Vec::new());

        Self {
            assets: PolledContainer::new("assets", Vec::new(), poll_interval, assets_fetch),
            pairs: PolledContainer::new("pairs", Vec::new(), poll_interval, pairs_fetch),
            api,
            user,
            exchange_rates,
        }
    }

    pub fn assets(&self) -> &PolledContainer<Vec<Asset>> {
        &self.assets
    }

    pub fn pairs(&self) -> &PolledContainer<Vec<Pair>> {
        &self.pairs
    }

    /// Signs a user in (or out with `None`). Asset polls skip while signed out.
    pub fn set_user(&self, user: Option<RegisteredUser>) {
        debug!(user_id = ?user.as_ref().map(|u| u.user_id.as_str()), "Ledger user changed");
        *self.user.write() = user;
    }

    pub fn user(&self) -> Option<RegisteredUser> {
        self.user.read().clone()
    }

    /// One-shot refresh of the asset list; a no-op without a user.
    pub async fn update_assets(&self) -> Result<()> {
        self.assets.refresh().await.map(|_| ())
    }

    pub fn get_asset(&self, asset_id: &str) -> Option<Asset> {
        if asset_id.is_empty() {
            return None;
        }
        self.assets.inner.sender.borrow().iter().find(|a| a.asset_id == asset_id).cloned()
    }

    pub fn exchange_rates(&self) -> Vec<ExchangeRate> {
        self.exchange_rates.borrow().clone()
    }

    pub fn subscribe_exchange_rates(&self) -> watch::Receiver<Vec<ExchangeRate>> {
        self.exchange_rates.subscribe()
    }

    pub fn set_exchange_rates(&self, rates: Vec<ExchangeRate>) {
        self.exchange_rates.send_replace(rates);
    }

    pub async fn refresh_exchange_rates(&self) -> Result<()> {
        let rates = self.api.fetch_exchange_rates().await?;
        self.set_exchange_rates(rates);
        Ok(())
    }

    pub fn total_balance_usd(&self) -> Option<Decimal> {
        total_value(&self.assets.inner.sender.borrow(), PriceKind::Usd)
    }

    pub fn total_balance_btc(&self) -> Option<Decimal> {
        total_value(&self.assets.inner.sender.borrow(), PriceKind::Btc)
    }
}

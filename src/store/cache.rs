//! One memoized async cell per structurally equal key.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::core::errors::{BridgeError, Result};

/// When a cached cell is replaced by a fresh fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// Replace cells whose fetch failed on the next `get`
    pub retry_failed: bool,
    /// Replace cells older than this
    pub ttl: Option<Duration>,
}

/// A shared, lazily awaited result. Every clone observes the same resolution.
pub struct AsyncCell<V> {
    future: Arc<Shared<BoxFuture<'static, Result<V, BridgeError>>>>,
}

impl<V> Clone for AsyncCell<V> {
    fn clone(&self) -> Self {
        Self { future: Arc::clone(&self.future) }
    }
}

impl<V> AsyncCell<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Wraps `future`; it is driven on the current Tokio runtime right away
    /// when one exists, otherwise on first `value()`.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<V>> + Send + 'static,
    {
        let shared = future.boxed().shared();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let driver = shared.clone();
            handle.spawn(async move {
                let _ = driver.await;
            });
        }
        Self { future: Arc::new(shared) }
    }

    pub async fn value(&self) -> Result<V> {
        (*self.future).clone().await
    }

    /// The resolution, if already available.
    pub fn peek(&self) -> Option<Result<V>> {
        self.future.peek().cloned()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.future, &other.future)
    }
}

struct CacheEntry<V> {
    cell: AsyncCell<V>,
    created_at: Instant,
}

impl<V> CacheEntry<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn is_stale(&self, policy: &CachePolicy) -> bool {
        let expired = policy.ttl.map_or(false, |ttl| self.created_at.elapsed() >= ttl);
        let failed = policy.retry_failed && matches!(self.cell.peek(), Some(Err(_)));
        expired || failed
    }
}

pub struct KeyedAsyncCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    policy: CachePolicy,
}

impl<K, V> KeyedAsyncCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(policy: CachePolicy) -> Self {
        Self { entries: Mutex::new(HashMap::new()), policy }
    }

    /// Returns the cell for `key`, calling `factory` only when no usable cell exists.
    pub fn get<F, Fut>(&self, key: K, factory: F) -> AsyncCell<V>
    where
        F: FnOnce(&K) -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(&key) {
            if !entry.is_stale(&self.policy) {
                debug!(?key, age = ?entry.created_at.elapsed(), "Cache hit");
                return entry.cell.clone();
            }
            debug!(?key, "Cached cell is stale, fetching again");
        } else {
            debug!(?key, "Cache miss");
        }

        let cell = AsyncCell::new(factory(&key));
        entries.insert(key, CacheEntry { cell: cell.clone(), created_at: Instant::now() });
        cell
    }

    /// Drops the cell for `key`; returns whether one existed.
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<K, V> Default for KeyedAsyncCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_factory(
        calls: &Arc<AtomicUsize>,
        result: Result<u32>,
    ) -> impl FnOnce(&String) -> BoxFuture<'static, Result<u32>> {
        let calls = Arc::clone(calls);
        move |_key: &String| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { result }.boxed()
        }
    }

    #[tokio::test]
    async fn test_same_key_shares_cell() {
        let cache: KeyedAsyncCache<String, u32> = KeyedAsyncCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let a = cache.get("k".to_string(), counting_factory(&calls, Ok(7)));
        let b = cache.get("k".to_string(), counting_factory(&calls, Ok(8)));

        assert!(a.ptr_eq(&b));
        assert_eq!(a.value().await.unwrap(), 7);
        assert_eq!(b.value().await.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_gets_run_factory_once() {
        let cache: Arc<KeyedAsyncCache<String, u32>> = Arc::new(KeyedAsyncCache::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(tokio::sync::Barrier::new(16));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    let cell = cache.get("k".to_string(), move |_key: &String| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        async {
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(42)
                        }
                        .boxed()
                    });
                    cell.value().await
                })
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            assert_eq!(result.unwrap().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_errors_reach_every_observer() {
        let cache: KeyedAsyncCache<String, u32> = KeyedAsyncCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let err = BridgeError::Network("down".into());

        let a = cache.get("k".to_string(), counting_factory(&calls, Err(err.clone())));
        let b = cache.get("k".to_string(), counting_factory(&calls, Ok(1)));
        assert_eq!(a.value().await, Err(err.clone()));
        assert_eq!(b.value().await, Err(err));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_failed_policy_replaces_failed_cell() {
        let cache: KeyedAsyncCache<String, u32> =
            KeyedAsyncCache::new(CachePolicy { retry_failed: true, ttl: None });
        let calls = Arc::new(AtomicUsize::new(0));

        let failed = cache.get("k".to_string(), counting_factory(&calls, Err(BridgeError::Timeout("t".into()))));
        assert!(failed.value().await.is_err());

        let retried = cache.get("k".to_string(), counting_factory(&calls, Ok(3)));
        assert!(!failed.ptr_eq(&retried));
        assert_eq!(retried.value().await.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_policy_expires_cell() {
        let cache: KeyedAsyncCache<String, u32> =
            KeyedAsyncCache::new(CachePolicy { retry_failed: false, ttl: Some(Duration::from_secs(60)) });
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.get("k".to_string(), counting_factory(&calls, Ok(1)));
        first.value().await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(cache.get("k".to_string(), counting_factory(&calls, Ok(2))).ptr_eq(&first));

        tokio::time::advance(Duration::from_secs(31)).await;
        let second = cache.get("k".to_string(), counting_factory(&calls, Ok(2)));
        assert_eq!(second.value().await.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache: KeyedAsyncCache<String, u32> = KeyedAsyncCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        cache.get("a".to_string(), counting_factory(&calls, Ok(1)));
        cache.get("b".to_string(), counting_factory(&calls, Ok(2)));
        assert_eq!(cache.len(), 2);

        assert!(cache.invalidate(&"a".to_string()));
        assert!(!cache.invalidate(&"a".to_string()));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cell_resolves_without_runtime_driver() {
        let cell = AsyncCell::new(async { Ok::<_, BridgeError>(5u32) });
        assert!(cell.peek().is_none());
        let value = futures::executor::block_on(cell.value()).unwrap();
        assert_eq!(value, 5);
        assert_eq!(cell.peek(), Some(Ok(5)));
    }
}

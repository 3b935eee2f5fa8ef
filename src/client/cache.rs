use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::FetchError;

type FetchResult = Result<Value, FetchError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

enum EntryState {
    /// A request for this key is in flight; later identical requests attach
    /// to it instead of issuing a duplicate call.
    InFlight(SharedFetch),
    /// Last known result. Kept until explicitly invalidated or revalidated.
    Ready {
        value: Value,
        fetched_at: Instant,
    },
}

/// Per-key query cache with in-flight request deduplication.
///
/// - `get_or_fetch` returns the cached value when present, otherwise starts
///   (or joins) a fetch.
/// - `revalidate` forces a re-fetch, except within the dedup window where the
///   fresh cached value is returned as-is.
/// - Errors are never cached: a failed fetch clears the slot so the next read
///   retries.
pub struct QueryCache {
    dedup_window: Duration,
    entries: Mutex<HashMap<String, EntryState>>,
}

impl QueryCache {
    pub fn new(dedup_window: Duration) -> Self {
        Self {
            dedup_window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_fetch<F>(&self, key: &str, fetch: F) -> FetchResult
    where
        F: Future<Output = FetchResult> + Send + 'static,
    {
        let shared = {
            let mut entries = self.lock();
            match entries.get(key) {
                Some(EntryState::Ready { value, .. }) => return Ok(value.clone()),
                Some(EntryState::InFlight(flight)) => flight.clone(),
                None => {
                    let flight = fetch.boxed().shared();
                    entries.insert(key.to_string(), EntryState::InFlight(flight.clone()));
                    flight
                }
            }
        };
        self.settle(key, shared).await
    }

    pub async fn revalidate<F>(&self, key: &str, fetch: F) -> FetchResult
    where
        F: Future<Output = FetchResult> + Send + 'static,
    {
        let shared = {
            let mut entries = self.lock();
            match entries.get(key) {
                Some(EntryState::Ready { value, fetched_at })
                    if fetched_at.elapsed() < self.dedup_window =>
                {
                    return Ok(value.clone());
                }
                Some(EntryState::InFlight(flight)) => flight.clone(),
                _ => {
                    let flight = fetch.boxed().shared();
                    entries.insert(key.to_string(), EntryState::InFlight(flight.clone()));
                    flight
                }
            }
        };
        self.settle(key, shared).await
    }

    async fn settle(&self, key: &str, shared: SharedFetch) -> FetchResult {
        let result = shared.clone().await;

        let mut entries = self.lock();
        // Only overwrite while our own flight is still recorded; a concurrent
        // invalidation or newer flight wins otherwise.
        if matches!(entries.get(key), Some(EntryState::InFlight(current)) if current.ptr_eq(&shared))
        {
            match &result {
                Ok(value) => {
                    entries.insert(
                        key.to_string(),
                        EntryState::Ready {
                            value: value.clone(),
                            fetched_at: Instant::now(),
                        },
                    );
                }
                Err(_) => {
                    entries.remove(key);
                }
            }
        }
        result
    }

    pub fn dedup_window(&self) -> Duration {
        self.dedup_window
    }

    /// Drop the entry for a key; the next read fetches fresh.
    pub fn invalidate(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Last known value for a key, if any (in-flight entries report `None`).
    pub fn peek(&self, key: &str) -> Option<Value> {
        match self.lock().get(key) {
            Some(EntryState::Ready { value, .. }) => Some(value.clone()),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, EntryState>> {
        self.entries.lock().expect("query cache lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_fetch(
        counter: &Arc<AtomicUsize>,
        value: Value,
    ) -> impl Future<Output = FetchResult> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(value)
        }
    }

    #[tokio::test]
    async fn concurrent_identical_reads_share_one_fetch() {
        let cache = QueryCache::new(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b, c) = tokio::join!(
            cache.get_or_fetch("k", counting_fetch(&calls, json!(1))),
            cache.get_or_fetch("k", counting_fetch(&calls, json!(2))),
            cache.get_or_fetch("k", counting_fetch(&calls, json!(3))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), json!(1));
        assert_eq!(b.unwrap(), json!(1));
        assert_eq!(c.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn cached_value_survives_until_invalidated() {
        let cache = QueryCache::new(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch("k", counting_fetch(&calls, json!("v")))
            .await
            .unwrap();
        cache
            .get_or_fetch("k", counting_fetch(&calls, json!("ignored")))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.invalidate("k");
        cache
            .get_or_fetch("k", counting_fetch(&calls, json!("v2")))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn revalidate_refetches_outside_the_window() {
        let cache = QueryCache::new(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch("k", counting_fetch(&calls, json!(1)))
            .await
            .unwrap();
        let v = cache
            .revalidate("k", counting_fetch(&calls, json!(2)))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(v, json!(2));
    }

    #[tokio::test]
    async fn revalidate_within_the_window_is_deduplicated() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch("k", counting_fetch(&calls, json!(1)))
            .await
            .unwrap();
        let v = cache
            .revalidate("k", counting_fetch(&calls, json!(2)))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(v, json!(1));
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = QueryCache::new(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Transport("connection refused".to_string()))
            }
        };
        assert!(cache.get_or_fetch("k", failing).await.is_err());
        assert!(cache.peek("k").is_none());

        let ok = cache
            .get_or_fetch("k", counting_fetch(&calls, json!("recovered")))
            .await
            .unwrap();
        assert_eq!(ok, json!("recovered"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

//! Read-through cache over a key/value store with request deduplication

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::singleflight::{FlightGroup, FlightResult};
use crate::domain::cache::{decode, encode, DegradePolicy, KeyValueStore, StoreOperation};
use crate::domain::DomainError;

/// Typed read-through cache
///
/// Values are stored JSON-encoded with one TTL fixed for the whole instance.
/// Concurrent lookups of the same key share a single store read and at most
/// one loader call.
pub struct ReadThroughCache<T> {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
    policy: DegradePolicy,
    flights: FlightGroup,
    _value: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for ReadThroughCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("ttl", &self.ttl)
            .field("policy", &self.policy)
            .field("flights", &self.flights)
            .finish()
    }
}

impl<T> ReadThroughCache<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            policy: DegradePolicy::default(),
            flights: FlightGroup::new(),
            _value: PhantomData,
        }
    }

    pub fn with_policy(mut self, policy: DegradePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn policy(&self) -> DegradePolicy {
        self.policy
    }

    /// Lookups currently waiting on a store read or loader
    pub fn in_flight(&self) -> usize {
        self.flights.in_flight()
    }

    /// Returns the cached value for `key`, running `loader` on a miss
    ///
    /// Only the caller that starts the flight reads the store and, on a miss,
    /// runs `loader`; callers arriving meanwhile receive its outcome. A loader
    /// error reaches every caller and nothing is stored. Decoding happens per
    /// caller, so a decode failure only affects the caller that hit it.
    pub async fn get_or_set<F, Fut>(&self, key: &str, loader: F) -> Result<T, DomainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DomainError>> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let ttl = self.ttl;
        let policy = self.policy;
        let owned_key = key.to_string();

        let (result, leader) = self
            .flights
            .run(key, move || populate(store, owned_key, ttl, policy, loader()))
            .await;

        if !leader {
            debug!(key = %key, "Joined in-flight cache lookup");
        }

        decode(&result?)
    }
}

async fn populate<T, Fut>(
    store: Arc<dyn KeyValueStore>,
    key: String,
    ttl: Duration,
    policy: DegradePolicy,
    load: Fut,
) -> FlightResult
where
    T: Serialize,
    Fut: Future<Output = Result<T, DomainError>>,
{
    match store.get(&key).await {
        Ok(Some(bytes)) => {
            debug!(key = %key, "Cache hit");
            return Ok(bytes);
        }
        Ok(None) => debug!(key = %key, "Cache miss, loading"),
        Err(e) => policy.handle(StoreOperation::Read, &key, e)?,
    }

    let bytes = encode(&load.await?)?;

    if let Err(e) = store.set(&key, bytes.clone(), ttl).await {
        policy.handle(StoreOperation::Write, &key, e)?;
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use mockall::predicate::eq;

    use crate::domain::cache::MockKeyValueStore;
    use crate::domain::entity::{Tag, Theme, User};
    use crate::infrastructure::cache::InMemoryStore;

    fn user(id: i64) -> User {
        User {
            id,
            name: format!("user{}", id),
            display_name: format!("User {}", id),
            description: String::new(),
            password: "hash".to_string(),
        }
    }

    type BoxedLoad = Pin<Box<dyn Future<Output = Result<User, DomainError>> + Send>>;

    fn counting_loader(calls: &Arc<AtomicUsize>, value: User) -> impl FnOnce() -> BoxedLoad {
        let calls = Arc::clone(calls);
        move || {
            let load: BoxedLoad = Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            });
            load
        }
    }

    #[tokio::test]
    async fn test_miss_loads_once_then_hits_store() {
        let store = Arc::new(InMemoryStore::new());
        let cache = ReadThroughCache::<User>::new(store.clone(), Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get_or_set("users:id:7", counting_loader(&calls, user(7)))
            .await
            .unwrap();
        assert_eq!(first, user(7));
        assert!(store.get("users:id:7").await.unwrap().is_some());

        let second = cache
            .get_or_set("users:id:7", counting_loader(&calls, user(99)))
            .await
            .unwrap();
        assert_eq!(second, user(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_call_loader_once() {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(ReadThroughCache::<User>::new(store, Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);

            handles.push(tokio::spawn(async move {
                cache
                    .get_or_set("users:id:7", move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(user(7))
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), user(7));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_expired_entry_is_reloaded() {
        let store = Arc::new(InMemoryStore::new());
        let cache = ReadThroughCache::<User>::new(store, Duration::from_millis(30));
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_set("users:id:7", counting_loader(&calls, user(7)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;

        let reloaded = cache
            .get_or_set("users:id:7", counting_loader(&calls, user(7)))
            .await
            .unwrap();

        assert_eq!(reloaded, user(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_store_read_error_falls_through_to_loader() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .with(eq("users:id:7"))
            .times(1)
            .returning(|_| Err(DomainError::cache("connection refused")));
        store.expect_set().times(1).returning(|_, _, _| Ok(()));

        let cache = ReadThroughCache::<User>::new(Arc::new(store), Duration::from_secs(60));

        let value = cache
            .get_or_set("users:id:7", || async { Ok(user(7)) })
            .await
            .unwrap();
        assert_eq!(value, user(7));
    }

    #[tokio::test]
    async fn test_store_write_error_still_returns_value() {
        let mut store = MockKeyValueStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .times(1)
            .returning(|_, _, _| Err(DomainError::cache("OOM command not allowed")));

        let cache = ReadThroughCache::<User>::new(Arc::new(store), Duration::from_secs(60));

        let value = cache
            .get_or_set("users:id:7", || async { Ok(user(7)) })
            .await
            .unwrap();
        assert_eq!(value, user(7));
    }

    #[tokio::test]
    async fn test_propagate_policy_surfaces_read_error() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .returning(|_| Err(DomainError::cache("connection refused")));
        store.expect_set().times(0);

        let cache = ReadThroughCache::<User>::new(Arc::new(store), Duration::from_secs(60))
            .with_policy(DegradePolicy::Propagate);
        let calls = Arc::new(AtomicUsize::new(0));

        let result = cache
            .get_or_set("users:id:7", counting_loader(&calls, user(7)))
            .await;

        assert_eq!(result, Err(DomainError::cache("connection refused")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_loader_error_is_returned_and_not_stored() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .with(eq("tags:id:5"))
            .returning(|_| Ok(None));
        store.expect_set().times(0);

        let cache = ReadThroughCache::<Tag>::new(Arc::new(store), Duration::from_secs(60));

        let result = cache
            .get_or_set("tags:id:5", || async {
                Err(DomainError::storage("Lost connection to MySQL server"))
            })
            .await;

        assert_eq!(
            result,
            Err(DomainError::storage("Lost connection to MySQL server"))
        );
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let store = Arc::new(InMemoryStore::new());
        let cache = ReadThroughCache::<User>::new(store.clone(), Duration::from_secs(60));

        let result = cache
            .get_or_set("users:name:ghost", || async {
                Err(DomainError::not_found("no rows in result set"))
            })
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert!(store.get("users:name:ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_undecodable_entry_errors_for_caller() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set("users:id:7", Bytes::from_static(b"not json"), Duration::from_secs(60))
            .await
            .unwrap();

        let cache = ReadThroughCache::<User>::new(store, Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let result = cache
            .get_or_set("users:id:7", counting_loader(&calls, user(7)))
            .await;

        assert!(matches!(result, Err(DomainError::Serialization { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_decode_failure_is_scoped_to_the_caller() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let users = ReadThroughCache::<User>::new(Arc::clone(&store), Duration::from_secs(60));
        let themes = ReadThroughCache::<Theme>::new(Arc::clone(&store), Duration::from_secs(60));

        users
            .get_or_set("shared", || async { Ok(user(7)) })
            .await
            .unwrap();

        let wrong = themes
            .get_or_set("shared", || async {
                Ok(Theme {
                    id: 1,
                    user_id: 7,
                    dark_mode: false,
                })
            })
            .await;
        assert!(matches!(wrong, Err(DomainError::Serialization { .. })));

        let right = users
            .get_or_set("shared", || async { Ok(user(8)) })
            .await
            .unwrap();
        assert_eq!(right, user(7));
    }
}

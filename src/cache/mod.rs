//! Per-environment, time-bucketed memoization.
//!
//! Freshness is aligned to fixed wall-clock buckets instead of per-call TTLs:
//! every caller inside one bucket shares a `(subject, epoch)` key, so repeated
//! lookups collapse onto one producer invocation per bucket. When the bucket
//! derived from stale state has fully expired, the environment's entries are
//! dropped wholesale and the bucket re-aligned to the current call.

pub mod bucket;
pub use bucket::TimeBucketer;

pub mod config;
pub use config::CacheConfig;

pub mod store;
pub use store::{CacheKey, CacheStore};

pub mod stats;
pub use stats::{CacheInfo, StatsRegistry};

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use crate::errors::Error;

struct Inner<V> {
    bucketer: TimeBucketer,
    store: CacheStore<V>,
    stats: StatsRegistry,
}

/// Memoizing invoker around a caller-supplied async producer.
///
/// State sits behind a `Mutex` held only for in-memory bookkeeping; the
/// producer always runs outside the lock. There is no single-flight guarantee:
/// two concurrent misses for one key may both run the producer, and the second
/// `put` overwrites the same key.
pub struct EnvironmentCache<V> {
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> EnvironmentCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                bucketer: TimeBucketer::new(config.durations),
                store: CacheStore::new(config.maxsize),
                stats: StatsRegistry::default(),
            }),
        }
    }

    /// Returns the memoized value for `(subject, environment)` in the current
    /// bucket, invoking `producer` on a miss. Producer failures propagate and
    /// are never stored, so the next call retries instead of serving a stale
    /// error for the rest of the bucket.
    pub async fn invoke<F, Fut>(&self, subject: &str, env: &str, producer: F) -> Result<V, Error>
    where
        F: FnOnce(String, String, SystemTime) -> Fut,
        Fut: Future<Output = Result<V, Error>>,
    {
        self.invoke_at(subject, env, SystemTime::now(), producer)
            .await
    }

    async fn invoke_at<F, Fut>(
        &self,
        subject: &str,
        env: &str,
        now: SystemTime,
        producer: F,
    ) -> Result<V, Error>
    where
        F: FnOnce(String, String, SystemTime) -> Fut,
        Fut: Future<Output = Result<V, Error>>,
    {
        let key = {
            let mut inner = self.inner.lock().unwrap();
            let duration = inner.bucketer.duration(env)?;
            let mut epoch = inner.bucketer.current_epoch(env, now)?;

            // The bucket anchored at last_access has fully expired: drop every
            // entry for the environment and re-align to the current call.
            // Strict comparison, so a call at the exact boundary keys a new
            // bucket without clearing.
            let anchor = inner.bucketer.last_access(env).unwrap_or(now);
            if now > anchor + duration {
                inner.store.clear_entries(env);
                inner.bucketer.reset(env, now);
                epoch = now;
                tracing::debug!(environment = env, "cache bucket rolled over");
            }

            let key = (subject.to_string(), epoch);
            if let Some(value) = inner.store.get(env, &key).cloned() {
                inner.stats.record_hit(env);
                tracing::trace!(environment = env, subject, "cache hit");
                return Ok(value);
            }
            inner.stats.record_miss(env);
            tracing::trace!(environment = env, subject, "cache miss");
            key
        };

        let value = producer(subject.to_string(), env.to_string(), key.1).await?;

        // A rollover may have cleared the environment while the producer ran;
        // the entry is still stored under its original epoch and will be the
        // first evicted once it is the oldest.
        let mut inner = self.inner.lock().unwrap();
        if let Some((evicted, _)) = inner.store.put(env, key, value.clone()) {
            tracing::debug!(environment = env, subject = %evicted, "evicted oldest cache entry");
        }
        Ok(value)
    }

    /// Drops entries, statistics, and bucket alignment for one environment,
    /// or for every environment when `env` is `None`.
    pub fn clear(&self, env: Option<&str>) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        match env {
            Some(env) => {
                inner.bucketer.duration(env)?;
                inner.store.remove_env(env);
                inner.stats.forget(env);
                inner.bucketer.forget(env);
                tracing::info!(environment = env, "cache cleared");
            }
            None => {
                inner.store.clear_all();
                inner.stats.forget_all();
                inner.bucketer.forget_all();
                tracing::info!("cache cleared for all environments");
            }
        }
        Ok(())
    }

    /// Hit/miss counters plus live size, for one environment or summed across
    /// all of them. `currsize` is counted on demand.
    pub fn stats(&self, env: Option<&str>) -> Result<CacheInfo, Error> {
        let inner = self.inner.lock().unwrap();
        let maxsize = inner.store.maxsize();
        match env {
            Some(env) => {
                inner.bucketer.duration(env)?;
                let counters = inner.stats.counters(env);
                Ok(CacheInfo {
                    hits: counters.hits,
                    misses: counters.misses,
                    maxsize,
                    currsize: inner.store.len(env),
                })
            }
            None => {
                let totals = inner.stats.totals();
                Ok(CacheInfo {
                    hits: totals.hits,
                    misses: totals.misses,
                    maxsize,
                    currsize: inner.store.total_len(),
                })
            }
        }
    }

    /// Start of the environment's current bucket. Pins bucket alignment on the
    /// environment's first access, like `invoke` does.
    pub fn current_epoch(&self, env: &str) -> Result<SystemTime, Error> {
        let mut inner = self.inner.lock().unwrap();
        inner.bucketer.current_epoch(env, SystemTime::now())
    }

    pub fn last_access(&self, env: &str) -> Result<Option<SystemTime>, Error> {
        let inner = self.inner.lock().unwrap();
        inner.bucketer.duration(env)?;
        Ok(inner.bucketer.last_access(env))
    }

    pub fn duration(&self, env: &str) -> Result<Duration, Error> {
        self.inner.lock().unwrap().bucketer.duration(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::UNIX_EPOCH;

    fn t(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn cache(maxsize: usize) -> EnvironmentCache<String> {
        let mut durations = BTreeMap::new();
        durations.insert("poc".to_string(), Duration::from_secs(120));
        durations.insert("dev".to_string(), Duration::from_secs(60));
        EnvironmentCache::new(CacheConfig { maxsize, durations })
    }

    /// Producer that records its invocation count and tags results with the
    /// call number, so a cached value is distinguishable from a fresh one.
    fn counting_producer(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn(String, String, SystemTime) -> std::future::Ready<Result<String, Error>> + Clone
    {
        move |subject, _env, _epoch| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(Ok(format!("{subject}#{n}")))
        }
    }

    fn failing_producer(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn(String, String, SystemTime) -> std::future::Ready<Result<String, Error>> + Clone
    {
        move |_subject, _env, _epoch| {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Err(Error::ClusterStatus {
                cluster: "minikube".to_string(),
                url: "https://127.0.0.1:8443/api/v1/namespaces".to_string(),
                status: 503,
            }))
        }
    }

    #[tokio::test]
    async fn same_bucket_serves_cached_value_with_one_producer_call() {
        let cache = cache(16);
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = counting_producer(calls.clone());

        let first = cache
            .invoke_at("a", "poc", t(0), producer.clone())
            .await
            .unwrap();
        let second = cache
            .invoke_at("a", "poc", t(50), producer)
            .await
            .unwrap();

        assert_eq!(first, "a#1");
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = cache.stats(Some("poc")).unwrap();
        assert_eq!((stats.hits, stats.misses, stats.currsize), (1, 1, 1));
    }

    #[tokio::test]
    async fn rollover_clears_environment_and_reinvokes_producer() {
        let cache = cache(16);
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = counting_producer(calls.clone());

        cache
            .invoke_at("a", "poc", t(0), producer.clone())
            .await
            .unwrap();
        // now(130) > epoch(0) + duration(120): full clear, fresh bucket at 130.
        let refreshed = cache
            .invoke_at("a", "poc", t(130), producer.clone())
            .await
            .unwrap();

        assert_eq!(refreshed, "a#2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Statistics survive rollover; only explicit clear drops them.
        let stats = cache.stats(Some("poc")).unwrap();
        assert_eq!((stats.hits, stats.misses, stats.currsize), (0, 2, 1));

        // The new bucket starts at 130: a call at 140 is a hit.
        let cached = cache.invoke_at("a", "poc", t(140), producer).await.unwrap();
        assert_eq!(cached, "a#2");
    }

    #[tokio::test]
    async fn bucketing_scenario_with_eviction_tie_break() {
        // duration=120s, maxsize=2, walked step by step.
        let cache = cache(2);
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = counting_producer(calls.clone());

        cache
            .invoke_at("a", "poc", t(0), producer.clone())
            .await
            .unwrap();
        cache
            .invoke_at("a", "poc", t(50), producer.clone())
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // t=130: rollover, (a, 130) stored.
        cache
            .invoke_at("a", "poc", t(130), producer.clone())
            .await
            .unwrap();
        // t=140: elapsed 10 < 120, epoch stays 130, (b, 130) stored.
        cache
            .invoke_at("b", "poc", t(140), producer.clone())
            .await
            .unwrap();
        assert_eq!(cache.stats(Some("poc")).unwrap().currsize, 2);

        // t=145: inserting (c, 130) overflows; epochs tie at 130, so the
        // smallest subject "a" is evicted.
        cache
            .invoke_at("c", "poc", t(145), producer.clone())
            .await
            .unwrap();
        assert_eq!(cache.stats(Some("poc")).unwrap().currsize, 2);

        let before = calls.load(Ordering::SeqCst);
        cache
            .invoke_at("b", "poc", t(150), producer.clone())
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), before, "b should still be cached");

        cache
            .invoke_at("a", "poc", t(150), producer)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), before + 1, "a was evicted");
    }

    #[tokio::test]
    async fn exact_boundary_keys_new_bucket_without_clearing() {
        let cache = cache(16);
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = counting_producer(calls.clone());

        cache
            .invoke_at("a", "poc", t(0), producer.clone())
            .await
            .unwrap();
        // elapsed == duration: not past expiry, but the floored boundary moves
        // to 120, so this is a miss under a new key with the old entry intact.
        cache
            .invoke_at("a", "poc", t(120), producer)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats(Some("poc")).unwrap().currsize, 2);
    }

    #[tokio::test]
    async fn producer_failure_is_never_memoized() {
        let cache = cache(16);
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = failing_producer(calls.clone());

        for i in 0..3 {
            let err = cache
                .invoke_at("a", "poc", t(10 + i), producer.clone())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::ClusterStatus { .. }));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let stats = cache.stats(Some("poc")).unwrap();
        assert_eq!((stats.hits, stats.misses, stats.currsize), (0, 3, 0));

        // A later success in the same bucket populates the cache normally.
        let ok_calls = Arc::new(AtomicUsize::new(0));
        let value = cache
            .invoke_at("a", "poc", t(20), counting_producer(ok_calls))
            .await
            .unwrap();
        assert_eq!(value, "a#1");
        assert_eq!(cache.stats(Some("poc")).unwrap().currsize, 1);
    }

    #[tokio::test]
    async fn entry_stored_after_mid_flight_clear_is_evicted_first() {
        let cache = Arc::new(cache(2));

        // The environment is cleared while the producer is still running; its
        // result lands under the original epoch anyway.
        let clearer = cache.clone();
        let stale = cache
            .invoke_at("a", "poc", t(0), move |_subject, _env, _epoch| async move {
                clearer.clear(Some("poc")).unwrap();
                Ok("stale".to_string())
            })
            .await
            .unwrap();
        assert_eq!(stale, "stale");
        assert_eq!(cache.stats(Some("poc")).unwrap().currsize, 1);
        // The clear dropped the bucket alignment along with the entries.
        assert_eq!(cache.last_access("poc").unwrap(), None);

        // The next call starts a fresh bucket at t=50: the leftover (a, 0)
        // entry must not be served as a hit for the new epoch.
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = counting_producer(calls.clone());
        let fresh = cache
            .invoke_at("a", "poc", t(50), producer.clone())
            .await
            .unwrap();
        assert_eq!(fresh, "a#1");
        assert_eq!(cache.stats(Some("poc")).unwrap().currsize, 2);

        // First overflow removes the leftover entry: it has the smallest
        // epoch, so it goes before anything from the live bucket.
        cache
            .invoke_at("b", "poc", t(60), producer.clone())
            .await
            .unwrap();
        assert_eq!(cache.stats(Some("poc")).unwrap().currsize, 2);

        let before = calls.load(Ordering::SeqCst);
        assert_eq!(
            cache
                .invoke_at("a", "poc", t(70), producer.clone())
                .await
                .unwrap(),
            "a#1"
        );
        cache
            .invoke_at("b", "poc", t(70), producer)
            .await
            .unwrap();
        assert_eq!(
            calls.load(Ordering::SeqCst),
            before,
            "both live-bucket entries survived the eviction"
        );
    }

    #[tokio::test]
    async fn unknown_environment_fails_every_operation() {
        let cache = cache(16);
        let calls = Arc::new(AtomicUsize::new(0));

        let err = cache
            .invoke_at("a", "staging", t(0), counting_producer(calls.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownEnvironment { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0, "producer must not run");

        assert!(matches!(
            cache.clear(Some("staging")),
            Err(Error::UnknownEnvironment { .. })
        ));
        assert!(matches!(
            cache.stats(Some("staging")),
            Err(Error::UnknownEnvironment { .. })
        ));
        assert!(matches!(
            cache.last_access("staging"),
            Err(Error::UnknownEnvironment { .. })
        ));
    }

    #[tokio::test]
    async fn clear_scopes_to_one_environment_or_all() {
        let cache = cache(16);
        let producer = counting_producer(Arc::new(AtomicUsize::new(0)));

        cache
            .invoke_at("a", "poc", t(0), producer.clone())
            .await
            .unwrap();
        cache
            .invoke_at("a", "dev", t(0), producer.clone())
            .await
            .unwrap();

        cache.clear(Some("poc")).unwrap();
        let poc = cache.stats(Some("poc")).unwrap();
        assert_eq!((poc.hits, poc.misses, poc.currsize), (0, 0, 0));
        let dev = cache.stats(Some("dev")).unwrap();
        assert_eq!((dev.misses, dev.currsize), (1, 1));

        // poc's bucket alignment was reset too: a call at t=5000 starts a
        // fresh bucket instead of a boundary derived from t=0.
        cache
            .invoke_at("a", "poc", t(5000), producer.clone())
            .await
            .unwrap();
        assert_eq!(cache.last_access("poc").unwrap(), Some(t(5000)));

        cache.clear(None).unwrap();
        let all = cache.stats(None).unwrap();
        assert_eq!((all.hits, all.misses, all.currsize), (0, 0, 0));
    }
}

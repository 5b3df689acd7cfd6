// ⏳ Memoization with a fixed time-to-live
// Entries are reused while `now - computed_at < ttl`, otherwise recomputed
// and overwritten. There is no other invalidation.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    computed_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Fresh value for `key` at time `now`, if any
    pub fn get_at(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| now - entry.computed_at < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub fn insert_at(&mut self, key: K, value: V, now: DateTime<Utc>) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                computed_at: now,
            },
        );
    }

    /// Return the cached value or compute, store and return a new one.
    ///
    /// A failed computation leaves any stale entry in place; it will be
    /// retried on the next call.
    pub fn get_or_try_insert_at<E>(
        &mut self,
        key: K,
        now: DateTime<Utc>,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get_at(&key, now) {
            return Ok(value);
        }

        let value = compute()?;
        self.insert_at(key, value.clone(), now);
        Ok(value)
    }

    pub fn get_or_try_insert<E>(
        &mut self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        self.get_or_try_insert_at(key, Utc::now(), compute)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn test_reuses_value_before_expiry() {
        let mut cache = TtlCache::new(Duration::seconds(3600));
        let t0 = Utc::now();
        let mut calls = 0;

        let first = cache
            .get_or_try_insert_at("lex.csv", t0, || {
                calls += 1;
                Ok::<_, Infallible>(1)
            })
            .unwrap();
        let second = cache
            .get_or_try_insert_at("lex.csv", t0 + Duration::seconds(3599), || {
                calls += 1;
                Ok::<_, Infallible>(2)
            })
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_recomputes_after_expiry() {
        let mut cache = TtlCache::new(Duration::seconds(3600));
        let t0 = Utc::now();

        cache.insert_at("lex.csv", 1, t0);
        let value = cache
            .get_or_try_insert_at("lex.csv", t0 + Duration::seconds(3600), || {
                Ok::<_, Infallible>(2)
            })
            .unwrap();

        assert_eq!(value, 2);
        // The overwritten entry is fresh relative to its recompute time
        assert_eq!(
            cache.get_at(&"lex.csv", t0 + Duration::seconds(7199)),
            Some(2)
        );
        assert_eq!(cache.get_at(&"lex.csv", t0 + Duration::seconds(7200)), None);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut cache = TtlCache::new(Duration::seconds(60));
        let now = Utc::now();

        cache.insert_at("a", 1, now);
        cache.insert_at("b", 2, now);

        assert_eq!(cache.get_at(&"a", now), Some(1));
        assert_eq!(cache.get_at(&"b", now), Some(2));
        assert_eq!(cache.get_at(&"c", now), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failed_compute_is_not_cached() {
        let mut cache: TtlCache<&str, i32> = TtlCache::new(Duration::seconds(60));
        let now = Utc::now();

        let err = cache.get_or_try_insert_at("bad", now, || Err("boom"));
        assert_eq!(err, Err("boom"));
        assert!(cache.is_empty());

        let ok = cache.get_or_try_insert_at("bad", now, || Ok::<_, &str>(5));
        assert_eq!(ok, Ok(5));
    }
}

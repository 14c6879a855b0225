use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Memoization – (key, producer, freshness policy) → stored value
// ---------------------------------------------------------------------------

/// When a cached value may be reused.
#[derive(Debug, Clone, Copy)]
pub enum Freshness {
    /// Never expires. Used for parsed exports: uploaded bytes are
    /// immutable, so the extraction keyed by their hash stays valid.
    KeepForever,
    /// Expires after the given age. Used for the ledger, which is an
    /// external mutable source of truth.
    Ttl(Duration),
}

struct Entry<V> {
    stored_at: Instant,
    value: V,
}

/// A small explicit cache injected into the pipeline instead of hidden
/// global state. Producer failures are returned and not cached.
pub struct Cache<K, V> {
    freshness: Freshness,
    entries: HashMap<K, Entry<V>>,
}

impl<K: Eq + Hash, V: Clone> Cache<K, V> {
    pub fn new(freshness: Freshness) -> Self {
        Self {
            freshness,
            entries: HashMap::new(),
        }
    }

    /// Return the fresh cached value for `key`, or run `producer` and
    /// store its result.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        producer: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(entry) = self.entries.get(&key) {
            if self.is_fresh(entry) {
                return Ok(entry.value.clone());
            }
        }
        let value = producer()?;
        self.entries.insert(
            key,
            Entry {
                stored_at: Instant::now(),
                value: value.clone(),
            },
        );
        Ok(value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn is_fresh(&self, entry: &Entry<V>) -> bool {
        match self.freshness {
            Freshness::KeepForever => true,
            Freshness::Ttl(ttl) => entry.stored_at.elapsed() < ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_lookups_run_the_producer_once() {
        let mut cache: Cache<u64, i32> = Cache::new(Freshness::KeepForever);
        let mut calls = 0;
        for _ in 0..3 {
            let v = cache
                .get_or_try_insert_with(42, || -> Result<i32, ()> {
                    calls += 1;
                    Ok(7)
                })
                .unwrap();
            assert_eq!(v, 7);
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn expired_entries_re_run_the_producer() {
        let mut cache: Cache<&str, i32> = Cache::new(Freshness::Ttl(Duration::ZERO));
        let mut calls = 0;
        for _ in 0..2 {
            cache
                .get_or_try_insert_with("ledger", || -> Result<i32, ()> {
                    calls += 1;
                    Ok(1)
                })
                .unwrap();
        }
        assert_eq!(calls, 2);
    }

    #[test]
    fn producer_errors_are_not_cached() {
        let mut cache: Cache<u64, i32> = Cache::new(Freshness::KeepForever);
        let err: Result<i32, &str> = cache.get_or_try_insert_with(1, || Err("boom"));
        assert!(err.is_err());
        let ok = cache
            .get_or_try_insert_with(1, || -> Result<i32, &str> { Ok(5) })
            .unwrap();
        assert_eq!(ok, 5);
    }
}

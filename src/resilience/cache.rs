//! In-memory TTL cache.
//!
//! Absolute TTL, no sliding refresh. Entries are visible while `now < expires_at`
//! and evicted lazily on access. No size bound: the request volume this serves
//! is small and every entry expires.
//!
//! Values go in and come out as clones, so a caller mutating what it got back
//! cannot corrupt the stored entry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    expires_at: Instant,
    value: V,
}

#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    store: HashMap<String, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    /// A zero TTL disables the cache: `get` always misses and `set` is a no-op.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            store: HashMap::new(),
        }
    }

    pub fn with_ttl_secs(ttl_secs: u64) -> Self {
        Self::new(Duration::from_secs(ttl_secs))
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return a copy of the live entry for `key`, evicting it if expired.
    pub fn get(&mut self, key: &str, now: Instant) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }
        match self.store.get(key) {
            None => return None,
            Some(entry) if now < entry.expires_at => return Some(entry.value.clone()),
            Some(_) => {}
        }
        self.store.remove(key);
        None
    }

    /// Store a copy of `value` under `key` until `now + ttl`.
    pub fn set(&mut self, key: impl Into<String>, value: &V, now: Instant) {
        if !self.is_enabled() {
            return;
        }
        self.store.insert(
            key.into(),
            CacheEntry {
                expires_at: now + self.ttl,
                value: value.clone(),
            },
        );
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_within_ttl_then_miss_after() {
        let mut c: TtlCache<String> = TtlCache::with_ttl_secs(10);
        let t0 = Instant::now();
        c.set("k", &"v".to_string(), t0);

        assert_eq!(c.get("k", t0 + Duration::from_secs(9)), Some("v".to_string()));
        // Boundary: now == expires_at is already expired.
        assert_eq!(c.get("k", t0 + Duration::from_secs(10)), None);
        assert!(c.is_empty(), "expired entry should be evicted on access");
    }

    #[test]
    fn zero_ttl_disables_everything() {
        let mut c: TtlCache<u32> = TtlCache::with_ttl_secs(0);
        let t0 = Instant::now();
        c.set("k", &1, t0);
        assert!(!c.is_enabled());
        assert_eq!(c.get("k", t0), None);
        assert_eq!(c.len(), 0);
    }

    #[test]
    fn returned_values_do_not_alias_the_store() {
        let mut c: TtlCache<Vec<u32>> = TtlCache::with_ttl_secs(60);
        let t0 = Instant::now();
        let mut original = vec![1, 2, 3];
        c.set("k", &original, t0);
        original.push(4);

        let mut got = c.get("k", t0).unwrap();
        assert_eq!(got, vec![1, 2, 3]);
        got.clear();
        assert_eq!(c.get("k", t0).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn clear_drops_all_entries() {
        let mut c: TtlCache<u8> = TtlCache::with_ttl_secs(60);
        let t0 = Instant::now();
        c.set("a", &1, t0);
        c.set("b", &2, t0);
        c.clear();
        assert_eq!(c.get("a", t0), None);
        assert!(c.is_empty());
    }
}

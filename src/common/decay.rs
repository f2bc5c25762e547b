//! Time-decayed key/value store, the hard tier of the identity cache.
//!
//! Uses moka's concurrent cache as the storage substrate; expiry is tracked
//! per entry against an injectable [`Clock`].

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use moka::{
    ops::compute::{CompResult, Op},
    sync::Cache,
};

use crate::utils::time::Clock;

#[derive(Clone)]
struct Timed<V> {
    value: V,
    expires_at: Instant,
}

/// Thread-safe store whose entries expire at an absolute instant.
///
/// Expired entries are not swept in the background; they read as absent,
/// are dropped by the read that finds them expired, and are overwritten by
/// the next [`DecayStore::set`] for the same key. Capacity pressure may
/// still evict entries early, which callers observe as a miss; a full store
/// trades the once-per-ttl load bound for memory.
#[derive(Clone)]
pub struct DecayStore<K, V> {
    entries: Cache<K, Timed<V>>,
    clock: Arc<dyn Clock>,
}

impl<K, V> DecayStore<K, V>
where
    K: std::hash::Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Allocate a new [`DecayStore`].
    pub fn new(
        capacity: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            entries: Cache::new(capacity),
            clock,
        }
    }

    /// Store `value` until `ttl_secs` seconds from now, replacing any prior entry.
    pub fn set(
        &self,
        key: K,
        value: V,
        ttl_secs: u32,
    ) {
        let expires_at = self.clock.now() + Duration::from_secs(ttl_secs.into());
        self.entries.insert(key, Timed { value, expires_at });
    }

    /// Get the value for `key` unless it is absent or expired.
    pub fn get(
        &self,
        key: &K,
    ) -> Option<V> {
        let entry = self.entries.get(key)?;
        let now = self.clock.now();
        if now >= entry.expires_at {
            self.remove_expired(key, now);
            return None;
        }
        Some(entry.value)
    }

    /// Remove the entry for `key` only if it is expired at `now`.
    ///
    /// The check and the removal are atomic, so an entry stored by a
    /// concurrent [`DecayStore::set`] survives. Returns whether an entry was removed.
    pub fn remove_expired(
        &self,
        key: &K,
        now: Instant,
    ) -> bool {
        let result = self.entries.entry_by_ref(key).and_compute_with(|current| match current {
            Some(entry) if now >= entry.value().expires_at => Op::Remove,
            _ => Op::Nop,
        });
        matches!(result, CompResult::Removed(_))
    }

    /// Remove the entry for `key`, if any.
    ///
    /// Pending maintenance is flushed so the store no longer references the
    /// removed value once this returns.
    pub fn remove(
        &self,
        key: &K,
    ) {
        self.entries.invalidate(key);
        self.entries.run_pending_tasks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::ManualClock;

    fn store() -> (DecayStore<String, i32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (DecayStore::new(16, clock.clone()), clock)
    }

    #[test]
    fn test_get_before_expiry() {
        let (store, clock) = store();
        store.set("a".to_string(), 1, 10);
        clock.advance(Duration::from_millis(9_999));
        assert_eq!(store.get(&"a".to_string()), Some(1));
    }

    #[test]
    fn test_get_at_expiry_is_absent() {
        let (store, clock) = store();
        store.set("a".to_string(), 1, 10);
        clock.advance(Duration::from_secs(10));
        assert_eq!(store.get(&"a".to_string()), None);
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let (store, _) = store();
        store.set("a".to_string(), 1, 0);
        assert_eq!(store.get(&"a".to_string()), None);
    }

    #[test]
    fn test_set_overwrites_and_rearms() {
        let (store, clock) = store();
        store.set("a".to_string(), 1, 1);
        clock.advance(Duration::from_secs(2));
        store.set("a".to_string(), 2, 5);
        assert_eq!(store.get(&"a".to_string()), Some(2));
    }

    #[test]
    fn test_remove_expired_keeps_fresh_entry() {
        let (store, clock) = store();
        let stale_read_at = clock.now() + Duration::from_secs(1);
        store.set("a".to_string(), 1, 1);
        clock.advance(Duration::from_secs(2));

        // a newer set lands between the expired read and the removal
        store.set("a".to_string(), 2, 10);
        assert!(!store.remove_expired(&"a".to_string(), stale_read_at));
        assert_eq!(store.get(&"a".to_string()), Some(2));

        clock.advance(Duration::from_secs(10));
        assert!(store.remove_expired(&"a".to_string(), clock.now()));
        assert!(!store.remove_expired(&"a".to_string(), clock.now()));
    }

    #[test]
    fn test_remove() {
        let (store, _) = store();
        store.set("a".to_string(), 1, 10);
        store.remove(&"a".to_string());
        store.remove(&"missing".to_string());
        assert_eq!(store.get(&"a".to_string()), None);
    }
}

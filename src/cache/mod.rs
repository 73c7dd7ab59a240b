//! Keyed memoization with time-to-live expiry and a maximum-entry bound.
//!
//! Every layout engine owns one [`EvictionCache`]. Eviction is lazy: nothing
//! runs on a timer. A write first sweeps the cache if it already holds more
//! than `max_entries`, and a read treats an expired entry as a miss without
//! removing it. Callers recompute on a miss and overwrite the stale entry.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// TTL and size bound for one cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl CacheSettings {
    pub const HISTOGRAM: Self = Self {
        ttl: Duration::from_secs(30),
        max_entries: 50,
    };

    pub const SANKEY_LAYOUT: Self = Self {
        ttl: Duration::from_secs(60),
        max_entries: 20,
    };

    pub const NODE_SORT: Self = Self {
        ttl: Duration::from_secs(30),
        max_entries: 50,
    };

    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self { ttl, max_entries }
    }
}

/// A stored payload. Entries are replaced, never mutated in place, because the
/// payload is handed out by reference to every caller that hits the key.
#[derive(Debug)]
pub struct CacheEntry<V> {
    pub key: String,
    pub payload: Arc<V>,
    pub timestamp: Duration,
    seq: u64,
}

pub struct EvictionCache<V> {
    name: &'static str,
    settings: CacheSettings,
    clock: Arc<dyn Clock>,
    entries: HashMap<String, CacheEntry<V>>,
    next_seq: u64,
}

impl<V> fmt::Debug for EvictionCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvictionCache")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<V> EvictionCache<V> {
    pub fn new(name: &'static str, settings: CacheSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            settings,
            clock,
            entries: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn with_system_clock(name: &'static str, settings: CacheSettings) -> Self {
        Self::new(name, settings, Arc::new(SystemClock::new()))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ttl(&self) -> Duration {
        self.settings.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.settings.max_entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Raw lookup, no TTL check.
    pub fn get(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Lookup that treats an entry older than the TTL as absent.
    pub fn get_fresh(&self, key: &str) -> Option<Arc<V>> {
        let entry = self.entries.get(key)?;
        if self.is_expired(entry) {
            tracing::debug!(cache = self.name, key, "expired entry treated as miss");
            return None;
        }
        Some(Arc::clone(&entry.payload))
    }

    pub fn is_expired(&self, entry: &CacheEntry<V>) -> bool {
        self.clock.now().saturating_sub(entry.timestamp) > self.settings.ttl
    }

    /// Store `payload` under `key`, replacing any previous entry.
    pub fn set(&mut self, key: impl Into<String>, payload: V) -> Arc<V> {
        self.set_shared(key, Arc::new(payload))
    }

    pub fn set_shared(&mut self, key: impl Into<String>, payload: Arc<V>) -> Arc<V> {
        if self.entries.len() > self.settings.max_entries {
            self.evict();
        }

        let key = key.into();
        let entry = CacheEntry {
            key: key.clone(),
            payload: Arc::clone(&payload),
            timestamp: self.clock.now(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(key, entry);
        payload
    }

    /// Return the fresh payload for `key`, or compute and store it.
    pub fn get_or_insert_with<F>(&mut self, key: &str, compute: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        if let Some(hit) = self.get_fresh(key) {
            tracing::debug!(cache = self.name, key, "cache hit");
            return hit;
        }
        tracing::debug!(cache = self.name, key, "cache miss");
        self.set(key, compute())
    }

    /// Drop one entry, or every entry when `key` is `None`.
    pub fn clear(&mut self, key: Option<&str>) {
        match key {
            Some(key) => {
                self.entries.remove(key);
            }
            None => self.entries.clear(),
        }
    }

    /// Run the TTL sweep, then the size sweep. Returns how many entries were removed.
    pub fn evict(&mut self) -> usize {
        let before = self.entries.len();
        let now = self.clock.now();
        let ttl = self.settings.ttl;
        self.entries
            .retain(|_, entry| now.saturating_sub(entry.timestamp) <= ttl);

        let max = self.settings.max_entries;
        if self.entries.len() > max {
            let mut by_age: Vec<(Duration, u64, String)> = self
                .entries
                .values()
                .map(|e| (e.timestamp, e.seq, e.key.clone()))
                .collect();
            by_age.sort();

            let excess = self.entries.len() - max;
            for (_, _, key) in by_age.into_iter().take(excess) {
                self.entries.remove(&key);
            }
        }

        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(
                cache = self.name,
                removed,
                remaining = self.entries.len(),
                "evicted entries"
            );
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with(max_entries: usize, ttl_secs: u64) -> (EvictionCache<u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = EvictionCache::new(
            "test",
            CacheSettings::new(Duration::from_secs(ttl_secs), max_entries),
            clock.clone(),
        );
        (cache, clock)
    }

    #[test]
    fn test_set_then_get_returns_same_instance() {
        let (mut cache, _clock) = cache_with(4, 30);
        let stored = cache.set("a", 7);
        let hit = cache.get_fresh("a").unwrap();
        assert!(Arc::ptr_eq(&stored, &hit));
        assert_eq!(cache.get("a").unwrap().key, "a");
    }

    #[test]
    fn test_expired_entry_is_a_miss_but_not_removed() {
        let (mut cache, clock) = cache_with(4, 30);
        cache.set("a", 1);

        clock.advance(Duration::from_secs(30));
        assert!(cache.get_fresh("a").is_some(), "age equal to TTL is still fresh");

        clock.advance(Duration::from_secs(1));
        assert!(cache.get_fresh("a").is_none());
        assert!(cache.contains_key("a"), "reads never evict");
    }

    #[test]
    fn test_overwrite_replaces_entry_and_timestamp() {
        let (mut cache, clock) = cache_with(4, 30);
        cache.set("a", 1);
        clock.advance(Duration::from_secs(31));
        cache.set("a", 2);

        assert_eq!(cache.len(), 1);
        assert_eq!(*cache.get_fresh("a").unwrap(), 2);
    }

    #[test]
    fn test_evict_keeps_newest_entries() {
        let (mut cache, clock) = cache_with(3, 600);
        for i in 0..6 {
            cache.set(format!("k{i}"), i);
            clock.advance(Duration::from_millis(10));
        }

        // The writes of k4 and k5 already swept k0 and k1.
        assert_eq!(cache.len(), 4);
        let removed = cache.evict();
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 3);
        for i in 0..3 {
            assert!(!cache.contains_key(&format!("k{i}")));
        }
        for i in 3..6 {
            assert!(cache.contains_key(&format!("k{i}")));
        }
    }

    #[test]
    fn test_evict_breaks_timestamp_ties_by_insertion_order() {
        let (mut cache, _clock) = cache_with(2, 600);
        for i in 0..4 {
            cache.set(format!("k{i}"), i);
        }

        cache.evict();
        assert!(cache.contains_key("k2"));
        assert!(cache.contains_key("k3"));
    }

    #[test]
    fn test_write_sweeps_only_once_size_exceeds_max() {
        let (mut cache, _clock) = cache_with(2, 600);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        // Size was exactly max before the third write, so no sweep yet.
        assert_eq!(cache.len(), 3);

        cache.set("d", 4);
        // Sweep trimmed to two, then "d" was added.
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains_key("a"));
        assert!(cache.contains_key("d"));
    }

    #[test]
    fn test_ttl_sweep_runs_before_size_sweep() {
        let (mut cache, clock) = cache_with(1, 10);
        cache.set("old", 1);
        clock.advance(Duration::from_secs(11));
        cache.set("new", 2);

        let removed = cache.evict();
        assert_eq!(removed, 1);
        assert!(cache.contains_key("new"));
    }

    #[test]
    fn test_clear_single_and_all() {
        let (mut cache, _clock) = cache_with(4, 30);
        cache.set("a", 1);
        cache.set("b", 2);

        cache.clear(Some("a"));
        assert!(!cache.contains_key("a"));
        assert_eq!(cache.len(), 1);

        cache.clear(None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_or_insert_with_recomputes_after_expiry() {
        let (mut cache, clock) = cache_with(4, 30);
        let mut calls = 0;
        let first = cache.get_or_insert_with("k", || {
            calls += 1;
            calls
        });
        let second = cache.get_or_insert_with("k", || unreachable!());
        assert!(Arc::ptr_eq(&first, &second));

        clock.advance(Duration::from_secs(31));
        let third = cache.get_or_insert_with("k", || 99);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*third, 99);
    }
}

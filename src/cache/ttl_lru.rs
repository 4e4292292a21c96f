//! Generic TTL + LRU cache.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

use super::SizeEstimate;
use crate::clock::SharedClock;
use crate::observability::metrics;

/// Share of an entry-bounded cache evicted at once when it overflows.
const BULK_EVICTION_RATIO: f64 = 0.1;

/// Upper bound on what a cache may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCapacity {
    /// At most this many entries; overflow evicts the oldest ~10% in bulk.
    Entries(usize),
    /// At most this many estimated bytes; overflow evicts LRU entries until
    /// the new value fits.
    Bytes(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub size_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

struct Entry<V> {
    value: V,
    inserted_at_ms: u64,
    last_access_ms: u64,
    tick: u64,
    size_bytes: usize,
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    /// Access tick → key, oldest first.
    recency: BTreeMap<u64, K>,
    next_tick: u64,
    size_bytes: usize,
    stats: CacheStats,
}

impl<K: Eq + Hash + Clone, V> Inner<K, V> {
    fn touch(&mut self, key: &K) {
        let tick = self.next_tick;
        self.next_tick += 1;
        if let Some(entry) = self.entries.get_mut(key) {
            self.recency.remove(&entry.tick);
            entry.tick = tick;
            self.recency.insert(tick, key.clone());
        }
    }

    fn remove(&mut self, key: &K) -> Option<Entry<V>> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.tick);
        self.size_bytes -= entry.size_bytes;
        Some(entry)
    }

    fn evict_lru(&mut self) -> bool {
        let Some((_, key)) = self.recency.pop_first() else {
            return false;
        };
        if let Some(entry) = self.entries.remove(&key) {
            self.size_bytes -= entry.size_bytes;
            self.stats.evictions += 1;
        }
        true
    }
}

/// Thread-safe cache with per-entry expiry and least-recently-used eviction.
pub struct TtlLruCache<K, V> {
    name: &'static str,
    capacity: CacheCapacity,
    ttl: Duration,
    clock: SharedClock,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> TtlLruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + SizeEstimate,
{
    pub fn new(name: &'static str, capacity: CacheCapacity, ttl: Duration, clock: SharedClock) -> Self {
        Self {
            name,
            capacity,
            ttl,
            clock,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                recency: BTreeMap::new(),
                next_tick: 0,
                size_bytes: 0,
                stats: CacheStats::default(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<K, V>> {
        // Entries are never left half-written, so poisoning is ignored.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, entry: &Entry<V>, now_ms: u64) -> bool {
        now_ms.saturating_sub(entry.inserted_at_ms) >= self.ttl.as_millis() as u64
    }

    /// Look up `key`, refreshing its recency. Expired entries are evicted
    /// and reported as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now_millis();
        let mut inner = self.lock();

        match inner.entries.get(key).map(|entry| self.is_expired(entry, now)) {
            None => {
                inner.stats.misses += 1;
                metrics::record_cache_lookup(self.name, false);
                return None;
            }
            Some(true) => {
                inner.remove(key);
                inner.stats.expirations += 1;
                inner.stats.misses += 1;
                metrics::record_cache_lookup(self.name, false);
                return None;
            }
            Some(false) => {}
        }

        inner.touch(key);
        inner.stats.hits += 1;
        metrics::record_cache_lookup(self.name, true);
        let entry = inner.entries.get_mut(key)?;
        entry.last_access_ms = now;
        Some(entry.value.clone())
    }

    /// Store `value`, evicting as the capacity requires. Returns `false`
    /// when the value alone exceeds a byte capacity and was not stored.
    pub fn insert(&self, key: K, value: V) -> bool {
        let size_bytes = value.estimated_size_bytes();
        let now = self.clock.now_millis();
        let mut inner = self.lock();
        inner.remove(&key);

        let evicted_before = inner.stats.evictions;
        match self.capacity {
            CacheCapacity::Entries(max) => {
                if max == 0 {
                    return false;
                }
                if inner.entries.len() >= max {
                    let batch = ((max as f64 * BULK_EVICTION_RATIO).ceil() as usize).max(1);
                    for _ in 0..batch {
                        if !inner.evict_lru() {
                            break;
                        }
                    }
                }
            }
            CacheCapacity::Bytes(max) => {
                if size_bytes > max {
                    tracing::debug!(
                        cache = self.name,
                        size_bytes,
                        max_bytes = max,
                        "Value larger than cache capacity, not cached"
                    );
                    return false;
                }
                while inner.size_bytes + size_bytes > max {
                    if !inner.evict_lru() {
                        break;
                    }
                }
            }
        }
        let evicted = inner.stats.evictions - evicted_before;
        if evicted > 0 {
            metrics::record_cache_evictions(self.name, evicted);
        }

        let tick = inner.next_tick;
        inner.next_tick += 1;
        inner.recency.insert(tick, key.clone());
        inner.size_bytes += size_bytes;
        inner.entries.insert(
            key,
            Entry {
                value,
                inserted_at_ms: now,
                last_access_ms: now,
                tick,
                size_bytes,
            },
        );
        true
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key).map(|e| e.value)
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.recency.clear();
        inner.size_bytes = 0;
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut inner = self.lock();
        let expired: Vec<K> = inner
            .entries
            .iter()
            .filter(|(_, e)| self.is_expired(e, now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            inner.remove(key);
        }
        inner.stats.expirations += expired.len() as u64;
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.entries.len(),
            size_bytes: inner.size_bytes,
            ..inner.stats
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq)]
    struct Blob(usize);

    impl SizeEstimate for Blob {
        fn estimated_size_bytes(&self) -> usize {
            self.0
        }
    }

    fn entry_cache(max: usize, ttl_secs: u64) -> (Arc<ManualClock>, TtlLruCache<u32, Blob>) {
        let clock = Arc::new(ManualClock::new(0));
        let cache = TtlLruCache::new(
            "test",
            CacheCapacity::Entries(max),
            Duration::from_secs(ttl_secs),
            clock.clone(),
        );
        (clock, cache)
    }

    #[test]
    fn test_set_then_get() {
        let (_, cache) = entry_cache(10, 60);
        assert!(cache.insert(1, Blob(1)));
        assert_eq!(cache.get(&1), Some(Blob(1)));
        assert_eq!(cache.get(&2), None);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_expired_entry_is_a_miss_and_evicted() {
        let (clock, cache) = entry_cache(10, 60);
        cache.insert(1, Blob(1));
        clock.advance(Duration::from_secs(59));
        assert!(cache.get(&1).is_some());
        clock.advance(Duration::from_secs(1));
        assert!(cache.get(&1).is_none());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_lru_order_respects_reads() {
        // Capacity 10 evicts one entry (10%) per overflow.
        let (_, cache) = entry_cache(10, 600);
        for k in 0..10 {
            cache.insert(k, Blob(1));
        }
        // Read 0 so that 1 becomes the least recently used.
        assert!(cache.get(&0).is_some());
        cache.insert(10, Blob(1));
        assert_eq!(cache.len(), 10);
        assert!(cache.get(&1).is_none());
        assert!(cache.get(&0).is_some());
        assert!(cache.get(&10).is_some());
    }

    #[test]
    fn test_bulk_eviction_for_large_entry_caches() {
        let (_, cache) = entry_cache(1000, 600);
        for k in 0..1000 {
            cache.insert(k, Blob(1));
        }
        cache.insert(1000, Blob(1));
        assert_eq!(cache.len(), 901);
        assert!(cache.get(&99).is_none());
        assert!(cache.get(&100).is_some());
        assert_eq!(cache.stats().evictions, 100);
    }

    #[test]
    fn test_byte_capacity() {
        let clock = Arc::new(ManualClock::new(0));
        let cache: TtlLruCache<&str, Blob> = TtlLruCache::new(
            "bytes",
            CacheCapacity::Bytes(100),
            Duration::from_secs(60),
            clock,
        );
        assert!(cache.insert("a", Blob(40)));
        assert!(cache.insert("b", Blob(40)));
        assert!(cache.insert("c", Blob(40)));
        assert!(cache.get(&"a").is_none());
        assert_eq!(cache.stats().size_bytes, 80);
        assert!(!cache.insert("huge", Blob(101)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_reinsert_replaces_and_resets_ttl() {
        let (clock, cache) = entry_cache(10, 60);
        cache.insert(1, Blob(1));
        clock.advance(Duration::from_secs(50));
        cache.insert(1, Blob(2));
        clock.advance(Duration::from_secs(50));
        assert_eq!(cache.get(&1), Some(Blob(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_purge_and_clear() {
        let (clock, cache) = entry_cache(10, 60);
        cache.insert(1, Blob(1));
        clock.advance(Duration::from_secs(30));
        cache.insert(2, Blob(1));
        clock.advance(Duration::from_secs(30));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&2), Some(Blob(1)));
        cache.clear();
        assert!(cache.is_empty());
    }
}

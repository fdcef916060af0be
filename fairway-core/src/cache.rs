//! TTL caching for provider-derived views.
//!
//! The engine owns two independent instances with different validity
//! windows: current conditions (short) and forecast data (longer, since
//! forecasts change far less often than live observation).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::model::Coordinate;

/// Compose a collision-free cache key: `"{operation}:{lat}_{lon}[:{param}]"`.
///
/// The operation prefix keeps distinct query shapes apart; the optional
/// param carries per-operation arguments such as a requested forecast
/// length.
pub fn cache_key(operation: &str, coordinate: Coordinate, param: Option<usize>) -> String {
    match param {
        Some(p) => format!("{operation}:{}:{p}", coordinate.key_fragment()),
        None => format!("{operation}:{}", coordinate.key_fragment()),
    }
}

/// A cached payload with its insertion timestamp and estimated size.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub inserted_at: Instant,
    pub size_bytes: usize,
}

/// Key→value store with a fixed validity window.
///
/// Expiry is lazy: a stale entry reads as absent and is only removed
/// opportunistically on the next write. Writes evict in insertion order
/// once the entry count or the estimated byte total goes over budget.
/// `get`/`put` are safe for concurrent callers; concurrent writes to the
/// same key are last-write-wins.
pub struct TtlCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
    max_count: usize,
    max_bytes: usize,
    size_of: fn(&T) -> usize,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration, max_count: usize, max_bytes: usize, size_of: fn(&T) -> usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_count,
            max_bytes,
            size_of,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.get_at(key, Instant::now())
    }

    /// `get` against an explicit clock, for deterministic expiry tests.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<T> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(key)?;
        if now.saturating_duration_since(entry.inserted_at) >= self.ttl {
            // Stale reads as absent; removal happens on the next write.
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn put(&self, key: String, value: T) {
        self.put_at(key, value, Instant::now());
    }

    /// `put` against an explicit clock, for deterministic expiry tests.
    pub fn put_at(&self, key: String, value: T, now: Instant) {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, e| now.saturating_duration_since(e.inserted_at) < self.ttl);
        let size_bytes = (self.size_of)(&value);
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                size_bytes,
            },
        );
        Self::enforce_budget(&mut entries, self.max_count, self.max_bytes);
    }

    /// Remove everything. Explicit administrative action, not part of expiry.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Number of stored entries, stale ones included (expiry is lazy).
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn enforce_budget(entries: &mut HashMap<String, CacheEntry<T>>, max_count: usize, max_bytes: usize) {
        loop {
            let total: usize = entries.values().map(|e| e.size_bytes).sum();
            if entries.len() <= max_count && total <= max_bytes {
                break;
            }
            // Least-recently-inserted first; read recency is irrelevant.
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    entries.remove(&k);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_size(_: &u32) -> usize {
        8
    }

    fn small_cache(ttl_secs: u64) -> TtlCache<u32> {
        TtlCache::new(Duration::from_secs(ttl_secs), 8, 1024, flat_size)
    }

    #[test]
    fn get_within_ttl_returns_value() {
        let cache = small_cache(600);
        let t0 = Instant::now();

        cache.put_at("current:51.5000_-0.1200".into(), 7, t0);

        assert_eq!(cache.get_at("current:51.5000_-0.1200", t0), Some(7));
        assert_eq!(
            cache.get_at("current:51.5000_-0.1200", t0 + Duration::from_secs(599)),
            Some(7)
        );
    }

    #[test]
    fn stale_entry_reads_as_absent() {
        let cache = small_cache(600);
        let t0 = Instant::now();

        cache.put_at("k".into(), 7, t0);

        // Exactly at the TTL boundary the entry is already stale.
        assert_eq!(cache.get_at("k", t0 + Duration::from_secs(600)), None);
        assert_eq!(cache.get_at("k", t0 + Duration::from_secs(6000)), None);
    }

    #[test]
    fn expiry_is_lazy_until_next_write() {
        let cache = small_cache(600);
        let t0 = Instant::now();

        cache.put_at("old".into(), 1, t0);
        assert_eq!(cache.len(), 1);

        // Stale but still resident.
        let later = t0 + Duration::from_secs(601);
        assert_eq!(cache.get_at("old", later), None);
        assert_eq!(cache.len(), 1);

        // The next write prunes it.
        cache.put_at("new".into(), 2, later);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at("new", later), Some(2));
    }

    #[test]
    fn count_budget_evicts_in_insertion_order() {
        let cache = TtlCache::new(Duration::from_secs(600), 2, 1024, flat_size);
        let t0 = Instant::now();

        cache.put_at("a".into(), 1, t0);
        cache.put_at("b".into(), 2, t0 + Duration::from_secs(1));
        cache.put_at("c".into(), 3, t0 + Duration::from_secs(2));

        let now = t0 + Duration::from_secs(3);
        assert_eq!(cache.get_at("a", now), None);
        assert_eq!(cache.get_at("b", now), Some(2));
        assert_eq!(cache.get_at("c", now), Some(3));
    }

    #[test]
    fn byte_budget_evicts_oldest_until_under() {
        fn big(_: &u32) -> usize {
            400
        }
        let cache = TtlCache::new(Duration::from_secs(600), 8, 1000, big);
        let t0 = Instant::now();

        cache.put_at("a".into(), 1, t0);
        cache.put_at("b".into(), 2, t0 + Duration::from_secs(1));
        cache.put_at("c".into(), 3, t0 + Duration::from_secs(2));

        // 3 × 400 = 1200 bytes: "a" goes.
        let now = t0 + Duration::from_secs(3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at("a", now), None);
        assert_eq!(cache.get_at("c", now), Some(3));
    }

    #[test]
    fn overwrite_is_last_write_wins() {
        let cache = small_cache(600);
        let t0 = Instant::now();

        cache.put_at("k".into(), 1, t0);
        cache.put_at("k".into(), 2, t0 + Duration::from_secs(1));

        assert_eq!(cache.get_at("k", t0 + Duration::from_secs(2)), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_removes_everything() {
        let cache = small_cache(600);
        let t0 = Instant::now();

        cache.put_at("a".into(), 1, t0);
        cache.put_at("b".into(), 2, t0);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get_at("a", t0), None);
    }

    #[test]
    fn cache_keys_do_not_collide_across_query_shapes() {
        let coord = Coordinate::new(51.5, -0.12);

        let current = cache_key("current", coord, None);
        let hourly_6 = cache_key("hourly", coord, Some(6));
        let hourly_24 = cache_key("hourly", coord, Some(24));
        let daily_7 = cache_key("daily", coord, Some(7));

        assert_eq!(current, "current:51.5000_-0.1200");
        assert_eq!(hourly_6, "hourly:51.5000_-0.1200:6");
        assert_ne!(hourly_6, hourly_24);
        assert_ne!(hourly_24, daily_7);
    }
}

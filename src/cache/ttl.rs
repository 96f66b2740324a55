//! Key/value cache with per-entry TTL and an optional on-disk mirror.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::hash::Hash;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::clock::{Clock, SystemClock};
use crate::observability::metrics;

/// Stored value with its absolute expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry<V> {
    value: V,
    /// Unix milliseconds. `None` never expires.
    expires_at_ms: Option<u64>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now_ms: u64) -> bool {
        matches!(self.expires_at_ms, Some(at) if now_ms >= at)
    }
}

/// Thread-safe TTL cache.
///
/// Expiry is checked against the clock when an entry is read; an expired
/// entry is dropped at that point. Nothing else evicts.
pub struct TtlCache<K, V> {
    name: &'static str,
    entries: DashMap<K, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
    persistence_path: Option<PathBuf>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache on the system clock.
    pub fn new(name: &'static str) -> Self {
        Self::with_clock(name, Arc::new(SystemClock))
    }

    pub fn with_clock(name: &'static str, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            clock,
            persistence_path: None,
        }
    }

    /// Mirror the cache to `path` on `save_to_file`.
    pub fn persist_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.persistence_path = Some(path.into());
        self
    }

    /// Read a live entry.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now_millis();
        if self.entries.remove_if(key, |_, entry| entry.is_expired(now)).is_some() {
            metrics::record_cache_lookup(self.name, "expired");
            return None;
        }
        match self.entries.get(key) {
            Some(entry) => {
                metrics::record_cache_lookup(self.name, "hit");
                Some(entry.value.clone())
            }
            None => {
                metrics::record_cache_lookup(self.name, "miss");
                None
            }
        }
    }

    /// Insert or replace an entry. `ttl` of `None` never expires.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        let expires_at_ms = ttl.map(|ttl| self.clock.now_millis().saturating_add(ttl.as_millis() as u64));
        self.entries.insert(key, CacheEntry { value, expires_at_ms });
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    /// Number of stored entries, expired ones included until read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Load a mirrored cache. A missing file yields an empty cache; entries
    /// that expired while on disk are skipped.
    pub fn load_from_file(
        name: &'static str,
        path: &Path,
        clock: Arc<dyn Clock>,
    ) -> std::io::Result<Self> {
        let cache = Self::with_clock(name, clock).persist_to(path);
        if path.exists() {
            let file = File::open(path)?;
            let reader = BufReader::new(file);
            let stored: Vec<(K, CacheEntry<V>)> = serde_json::from_reader(reader)?;

            let now = cache.clock.now_millis();
            for (key, entry) in stored {
                if !entry.is_expired(now) {
                    cache.entries.insert(key, entry);
                }
            }
            tracing::info!(cache = name, entries = cache.entries.len(), "Loaded cache from file");
        }
        Ok(cache)
    }

    /// Write live entries to the mirror file, if one is configured.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };
        let now = self.clock.now_millis();
        let stored: Vec<(K, CacheEntry<V>)> = self
            .entries
            .iter()
            .filter(|r| !r.value().is_expired(now))
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();

        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, &stored)?;
        tracing::info!(cache = self.name, entries = stored.len(), "Saved cache to file");
        Ok(())
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("name", &self.name)
            .field("persistence_path", &self.persistence_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;

    fn cache(clock: &Arc<ManualClock>) -> TtlCache<String, u32> {
        TtlCache::with_clock("test", clock.clone())
    }

    #[test]
    fn test_expired_on_read() {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = cache(&clock);

        cache.set("k".to_string(), 7, Some(Duration::from_millis(10)));
        assert_eq!(cache.get(&"k".to_string()), Some(7));

        clock.advance(Duration::from_millis(11));
        assert_eq!(cache.get(&"k".to_string()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entries_linger_until_read() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache(&clock);
        cache.set("a".to_string(), 1, Some(Duration::from_millis(5)));
        cache.set("b".to_string(), 2, None);

        clock.advance(Duration::from_secs(3600));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"b".to_string()), Some(2));
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_set_replaces_entry_and_ttl() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache(&clock);
        cache.set("k".to_string(), 1, Some(Duration::from_millis(5)));
        cache.set("k".to_string(), 2, Some(Duration::from_millis(50)));
        clock.advance(Duration::from_millis(20));
        assert_eq!(cache.get(&"k".to_string()), Some(2));
        assert_eq!(cache.remove(&"k".to_string()), Some(2));
        assert_eq!(cache.get(&"k".to_string()), None);
    }

    #[test]
    fn test_persistence() {
        let path = std::env::temp_dir().join(format!("drops_cache_{}.json", std::process::id()));
        let clock = Arc::new(ManualClock::new(10_000));

        let cache = TtlCache::<String, u32>::with_clock("test", clock.clone()).persist_to(&path);
        cache.set("live".to_string(), 1, Some(Duration::from_secs(60)));
        cache.set("short".to_string(), 2, Some(Duration::from_secs(1)));
        cache.set("forever".to_string(), 3, None);
        cache.save_to_file().unwrap();

        clock.advance(Duration::from_secs(5));
        let loaded = TtlCache::<String, u32>::load_from_file("test", &path, clock.clone()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(&"live".to_string()), Some(1));
        assert_eq!(loaded.get(&"forever".to_string()), Some(3));
        assert_eq!(loaded.get(&"short".to_string()), None);

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let path = std::env::temp_dir().join("drops_cache_does_not_exist.json");
        let loaded =
            TtlCache::<String, u32>::load_from_file("test", &path, Arc::new(ManualClock::new(0))).unwrap();
        assert!(loaded.is_empty());
    }
}

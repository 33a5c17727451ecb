//! Caller-owned snapshot memoization
//!
//! The engine holds no state; callers that recompute often can keep a
//! `SnapshotCache` next to it. Keys fingerprint the exact entry list (CRC32
//! over each bincode-encoded entry, length-prefixed as in a log record), the
//! window, the reference instant and the thresholds, so any edit to the entry
//! set produces a different key. A CRC collision would return a stale
//! snapshot; callers that cannot accept that should `clear()` on every write.

use crate::analytics::snapshot::{AnalyticsEngine, AnalyticsSnapshot};
use crate::config::AnalyticsConfig;
use crate::entry::{Entry, TimeWindow};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Default number of snapshots kept
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Identity of one engine invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub fingerprint: u32,
    pub entry_count: usize,
    pub window: TimeWindow,
    pub reference_millis: i64,
    pub config_fingerprint: u32,
}

impl SnapshotKey {
    /// Fingerprint an invocation
    pub fn new(
        entries: &[Entry],
        window: TimeWindow,
        now: DateTime<Utc>,
        config: &AnalyticsConfig,
    ) -> Result<Self, bincode::Error> {
        let mut hasher = crc32fast::Hasher::new();
        for entry in entries {
            let data = bincode::serialize(entry)?;
            hasher.update(&(data.len() as u32).to_le_bytes());
            hasher.update(&data);
        }

        Ok(Self {
            fingerprint: hasher.finalize(),
            entry_count: entries.len(),
            window,
            reference_millis: now.timestamp_millis(),
            config_fingerprint: crc32fast::hash(&bincode::serialize(config)?),
        })
    }
}

/// Cache hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Snapshots currently held
    pub len: usize,
    pub capacity: usize,
}

/// Least-recently-used store of computed snapshots
#[derive(Debug)]
pub struct SnapshotCache {
    capacity: usize,
    snapshots: HashMap<SnapshotKey, (Arc<AnalyticsSnapshot>, u64)>,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl SnapshotCache {
    /// Create a cache holding at most `capacity` snapshots (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            snapshots: HashMap::new(),
            clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached snapshot for this invocation, computing it on a miss
    pub fn get_or_compute(
        &mut self,
        engine: &AnalyticsEngine,
        entries: &[Entry],
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Arc<AnalyticsSnapshot> {
        let key = match SnapshotKey::new(entries, window, now, engine.config()) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(error = %e, "Could not fingerprint entries; computing uncached");
                self.misses += 1;
                return Arc::new(engine.analyze(entries, window, now));
            }
        };

        self.clock += 1;
        if let Some((snapshot, last_used)) = self.snapshots.get_mut(&key) {
            *last_used = self.clock;
            self.hits += 1;
            return Arc::clone(snapshot);
        }

        self.misses += 1;
        let snapshot = Arc::new(engine.analyze(entries, window, now));

        if self.snapshots.len() >= self.capacity {
            self.evict_oldest();
        }
        self.snapshots.insert(key, (Arc::clone(&snapshot), self.clock));

        snapshot
    }

    /// Drop every cached snapshot
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            len: self.snapshots.len(),
            capacity: self.capacity,
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .snapshots
            .iter()
            .min_by_key(|(_, (_, last_used))| *last_used)
            .map(|(key, _)| *key);

        if let Some(key) = oldest {
            self.snapshots.remove(&key);
            tracing::trace!(?key, "Evicted cached snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
    }

    fn entries() -> Vec<Entry> {
        (1..=5)
            .map(|i| Entry::new(now() - Duration::days(i), i as f64))
            .collect()
    }

    #[test]
    fn test_hit_returns_same_snapshot() {
        let engine = AnalyticsEngine::default();
        let mut cache = SnapshotCache::default();
        let entries = entries();

        let first = cache.get_or_compute(&engine, &entries, TimeWindow::Month, now());
        let second = cache.get_or_compute(&engine, &entries, TimeWindow::Month, now());

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_edit_changes_key() {
        let config = AnalyticsConfig::default();
        let mut edited = entries();
        let before = SnapshotKey::new(&edited, TimeWindow::Month, now(), &config).unwrap();

        edited[2].pain = 9.0;
        let after = SnapshotKey::new(&edited, TimeWindow::Month, now(), &config).unwrap();
        assert_ne!(before, after);

        let other_window = SnapshotKey::new(&edited, TimeWindow::Week, now(), &config).unwrap();
        assert_ne!(after, other_window);
    }

    #[test]
    fn test_config_changes_key() {
        let entries = entries();
        let a = SnapshotKey::new(&entries, TimeWindow::All, now(), &AnalyticsConfig::default()).unwrap();
        let config = AnalyticsConfig {
            onset_threshold: 3.0,
            ..AnalyticsConfig::default()
        };
        let b = SnapshotKey::new(&entries, TimeWindow::All, now(), &config).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let engine = AnalyticsEngine::default();
        let mut cache = SnapshotCache::new(2);
        let entries = entries();

        let month = cache.get_or_compute(&engine, &entries, TimeWindow::Month, now());
        cache.get_or_compute(&engine, &entries, TimeWindow::Week, now());
        // Touch Month so Week is the oldest
        cache.get_or_compute(&engine, &entries, TimeWindow::Month, now());
        cache.get_or_compute(&engine, &entries, TimeWindow::All, now());

        assert_eq!(cache.len(), 2);
        let again = cache.get_or_compute(&engine, &entries, TimeWindow::Month, now());
        assert!(Arc::ptr_eq(&month, &again));
        assert_eq!(cache.stats().misses, 3);

        cache.clear();
        assert!(cache.is_empty());
    }
}

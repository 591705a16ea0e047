//! Key-value store with a per-entry timeout.
//!
//! Every entry expires a fixed TTL after it was written. Expired entries are
//! invisible to readers immediately (checked on access) and are physically
//! removed by a periodic sweep, which is the only thing bounding memory use.
//! Snapshot persistence lives in [`persist`].

pub mod persist;

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// How often the background sweep removes expired entries.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// A stored value together with its absolute expiry time (unix millis).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    pub expires_at: i64,
    pub value: V,
}

/// Handle that turns dirty whenever the cache it came from changes.
///
/// Created via [`TimeoutCache::create_invalidator`]. A consumer polls
/// [`Invalidator::is_dirty`] to decide whether its derived state (e.g. a disk
/// snapshot) is stale, then calls [`Invalidator::clear`]. Dropping the handle
/// removes it from the cache's tracking.
pub struct Invalidator {
    flag: Arc<AtomicBool>,
    registry: Weak<Mutex<Vec<Arc<AtomicBool>>>>,
}

impl Invalidator {
    pub fn is_dirty(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Drop for Invalidator {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut flags) = registry.lock() {
                flags.retain(|f| !Arc::ptr_eq(f, &self.flag));
            }
        }
    }
}

struct Shared<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    invalidators: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
}

/// A cache whose entries each live for a fixed TTL from their last write.
///
/// Cloning is cheap and clones share the same store.
pub struct TimeoutCache<K, V> {
    name: String,
    ttl: Duration,
    shared: Arc<Shared<K, V>>,
}

impl<K, V> Clone for TimeoutCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            ttl: self.ttl,
            shared: Arc::clone(&self.shared),
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl<K, V> TimeoutCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache. `name` only shows up in log lines.
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            ttl,
            shared: Arc::new(Shared {
                entries: Mutex::new(HashMap::new()),
                invalidators: Arc::new(Mutex::new(Vec::new())),
            }),
        }
    }

    /// Insert or overwrite. The entry expires `ttl` from now.
    pub fn set(&self, key: K, value: V) {
        let entry = CacheEntry {
            expires_at: now_millis() + self.ttl.as_millis() as i64,
            value,
        };
        self.lock_entries().insert(key, entry);
        self.mark_dirty();
    }

    /// Replace the value of an existing entry, optionally restarting its TTL.
    ///
    /// Returns false (and stores nothing) if the key is not present.
    pub fn update(&self, key: &K, value: V, restart_timeout: bool) -> bool {
        let mut entries = self.lock_entries();
        let Some(entry) = entries.get_mut(key) else {
            return false;
        };

        if restart_timeout {
            entry.expires_at = now_millis() + self.ttl.as_millis() as i64;
        }
        entry.value = value;
        drop(entries);

        self.mark_dirty();
        true
    }

    /// Get the value for a key, or None if absent or past its TTL.
    ///
    /// An expired entry the sweep has not reached yet is removed here, so
    /// readers never observe stale values.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.lock_entries();
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > now_millis() => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
            drop(entries);
            self.mark_dirty();
        }
        None
    }

    /// Whether a live (non-expired) entry exists for the key.
    pub fn has(&self, key: &K) -> bool {
        let entries = self.lock_entries();
        match entries.get(key) {
            Some(entry) => entry.expires_at > now_millis(),
            None => false,
        }
    }

    /// Hand out a dirty-tracking handle for this cache.
    pub fn create_invalidator(&self) -> Invalidator {
        let flag = Arc::new(AtomicBool::new(false));
        if let Ok(mut flags) = self.shared.invalidators.lock() {
            flags.push(Arc::clone(&flag));
        }
        Invalidator {
            flag,
            registry: Arc::downgrade(&self.shared.invalidators),
        }
    }

    /// Snapshot every entry, expiry timestamps included.
    pub fn export(&self) -> Vec<(K, CacheEntry<V>)> {
        self.lock_entries()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Write snapshot data back into the store, replacing entries that share
    /// a key and leaving everything else alone. Entries that are already past
    /// their expiry will be dropped on access or by the next sweep.
    pub fn import(&self, snapshot: Vec<(K, CacheEntry<V>)>) {
        let mut entries = self.lock_entries();
        for (key, entry) in snapshot {
            entries.insert(key, entry);
        }
    }

    /// Remove every expired entry now. Returns how many were removed.
    pub fn sweep_now(&self) -> usize {
        let now = now_millis();
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - entries.len();
        drop(entries);

        if removed > 0 {
            tracing::debug!(cache = %self.name, removed, "Swept expired cache entries");
            self.mark_dirty();
        }
        removed
    }

    /// Periodic sweep loop. Runs until the token is cancelled.
    pub async fn run_sweeper(&self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(cache = %self.name, "Sweep loop stopped (shutdown)");
                    return;
                }
                _ = tokio::time::sleep(SWEEP_INTERVAL) => {}
            }
            self.sweep_now();
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        // Lock poisoning would mean a panic mid-write; propagating it here
        // would just turn every later access into a panic too.
        match self.shared.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn mark_dirty(&self) {
        if let Ok(flags) = self.shared.invalidators.lock() {
            for flag in flags.iter() {
                flag.store(true, Ordering::Release);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ttl_ms: u64) -> TimeoutCache<String, String> {
        TimeoutCache::new("test", Duration::from_millis(ttl_ms))
    }

    #[test]
    fn set_then_get_within_ttl() {
        let c = cache(10_000);
        c.set("a".into(), "1".into());
        assert_eq!(c.get(&"a".to_string()), Some("1".to_string()));
        assert!(c.has(&"a".to_string()));
    }

    #[test]
    fn expired_entry_is_absent_before_any_sweep() {
        let c = cache(20);
        c.set("a".into(), "1".into());
        std::thread::sleep(Duration::from_millis(60));

        // No sweep has run; the read path itself must hide the entry.
        assert_eq!(c.get(&"a".to_string()), None);
        assert!(!c.has(&"a".to_string()));
    }

    #[test]
    fn update_missing_key_creates_nothing() {
        let c = cache(10_000);
        assert!(!c.update(&"ghost".to_string(), "1".into(), false));
        assert!(!c.has(&"ghost".to_string()));
        assert_eq!(c.len(), 0);
    }

    #[test]
    fn update_existing_key_replaces_value() {
        let c = cache(10_000);
        c.set("a".into(), "1".into());
        assert!(c.update(&"a".to_string(), "2".into(), false));
        assert_eq!(c.get(&"a".to_string()), Some("2".to_string()));
    }

    #[test]
    fn update_can_restart_the_timeout() {
        let c = cache(80);
        c.set("a".into(), "1".into());
        std::thread::sleep(Duration::from_millis(50));
        assert!(c.update(&"a".to_string(), "2".into(), true));
        std::thread::sleep(Duration::from_millis(50));

        // Original deadline has passed but the restarted one has not.
        assert_eq!(c.get(&"a".to_string()), Some("2".to_string()));
    }

    #[test]
    fn sweep_removes_expired_entries() {
        let c = cache(20);
        c.set("a".into(), "1".into());
        c.set("b".into(), "2".into());
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(c.sweep_now(), 2);
        assert_eq!(c.len(), 0);
    }

    #[test]
    fn invalidator_tracks_writes_and_sweeps() {
        let c = cache(10_000);
        let inv = c.create_invalidator();
        assert!(!inv.is_dirty());

        c.set("a".into(), "1".into());
        assert!(inv.is_dirty());

        inv.clear();
        assert!(!inv.is_dirty());

        c.update(&"a".to_string(), "2".into(), false);
        assert!(inv.is_dirty());

        // A sweep that removes nothing stays clean.
        inv.clear();
        c.sweep_now();
        assert!(!inv.is_dirty());
    }

    #[test]
    fn sweep_that_removes_entries_marks_dirty() {
        let c = cache(20);
        c.set("a".into(), "1".into());
        let inv = c.create_invalidator();
        inv.clear();
        std::thread::sleep(Duration::from_millis(60));
        assert!(c.sweep_now() > 0);
        assert!(inv.is_dirty());
    }

    #[test]
    fn dropped_invalidator_is_forgotten() {
        let c = cache(10_000);
        let inv = c.create_invalidator();
        drop(inv);
        // Would poison the registry if the drop hadn't unregistered it.
        c.set("a".into(), "1".into());
        assert_eq!(c.shared.invalidators.lock().unwrap().len(), 0);
    }

    #[test]
    fn export_import_round_trips_and_overwrites() {
        let a = cache(10_000);
        a.set("x".into(), "1".into());
        a.set("y".into(), "2".into());

        let b = cache(10_000);
        b.set("y".into(), "old".into());
        b.set("z".into(), "3".into());
        b.import(a.export());

        assert_eq!(b.get(&"x".to_string()), Some("1".to_string()));
        assert_eq!(b.get(&"y".to_string()), Some("2".to_string()));
        assert_eq!(b.get(&"z".to_string()), Some("3".to_string()));
    }

    #[test]
    fn imported_expiry_timestamps_are_honored() {
        let a = cache(20);
        a.set("x".into(), "1".into());
        let snapshot = a.export();

        std::thread::sleep(Duration::from_millis(60));

        let b = cache(10_000);
        b.import(snapshot);
        assert_eq!(b.get(&"x".to_string()), None);
    }

    #[test]
    fn clones_share_the_store() {
        let a = cache(10_000);
        let b = a.clone();
        a.set("k".into(), "v".into());
        assert_eq!(b.get(&"k".to_string()), Some("v".to_string()));
    }
}

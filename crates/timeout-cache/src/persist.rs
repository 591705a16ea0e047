//! Disk snapshots for a [`TimeoutCache`].
//!
//! A snapshot is a JSON array of `[key, {expires_at, value}]` pairs, written
//! wholesale whenever the cache has changed since the last tick. Each cache
//! persists to its own file; there is no coordination between them.

use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::TimeoutCache;

/// How often the persist loop checks whether the cache changed.
pub const PERSIST_INTERVAL: Duration = Duration::from_secs(10);

/// Load a snapshot file into the cache, if one exists.
///
/// Must be awaited before the cache is handed to consumers, since they may
/// query it immediately. A missing or unreadable file is treated as an empty
/// cache, never an error: losing a snapshot only costs warm-up time.
pub async fn load_snapshot<K, V>(cache: &TimeoutCache<K, V>, path: &Path)
where
    K: Eq + Hash + Clone + DeserializeOwned,
    V: Clone + DeserializeOwned,
{
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
        Err(e) => {
            tracing::warn!(cache = %cache.name(), path = %path.display(), error = %e,
                "Could not read cache snapshot, starting cold");
            return;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(snapshot) => {
            cache.import(snapshot);
            tracing::info!(cache = %cache.name(), entries = cache.len(),
                "Loaded cache snapshot");
        }
        Err(e) => {
            tracing::warn!(cache = %cache.name(), path = %path.display(), error = %e,
                "Malformed cache snapshot, starting cold");
        }
    }
}

/// Serialize the full cache to its snapshot file.
pub async fn write_snapshot<K, V>(cache: &TimeoutCache<K, V>, path: &Path)
where
    K: Eq + Hash + Clone + Serialize,
    V: Clone + Serialize,
{
    let snapshot = cache.export();
    let json = match serde_json::to_vec(&snapshot) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(cache = %cache.name(), error = %e, "Could not serialize cache");
            return;
        }
    };

    if let Err(e) = tokio::fs::write(path, json).await {
        tracing::warn!(cache = %cache.name(), path = %path.display(), error = %e,
            "Could not write cache snapshot");
    } else {
        tracing::debug!(cache = %cache.name(), entries = snapshot.len(),
            "Wrote cache snapshot");
    }
}

/// Keep a cache's snapshot file up to date until cancelled.
///
/// Each tick the loop polls the cache's invalidator; if nothing changed the
/// write is skipped so an idle process does no disk I/O.
pub async fn run_persist_loop<K, V>(
    cache: TimeoutCache<K, V>,
    path: PathBuf,
    cancel: CancellationToken,
) where
    K: Eq + Hash + Clone + Serialize,
    V: Clone + Serialize,
{
    let invalidator = cache.create_invalidator();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(cache = %cache.name(), "Persist loop stopped (shutdown)");
                return;
            }
            _ = tokio::time::sleep(PERSIST_INTERVAL) => {}
        }

        if !invalidator.is_dirty() {
            continue;
        }

        write_snapshot(&cache, &path).await;
        invalidator.clear();
    }
}

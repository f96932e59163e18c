use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;

use crate::clock::{Clock, SystemClock};
use crate::config::{ttl_from_secs, AgingMapConfig};
use crate::entry::Entry;
use crate::error::AgingMapError;

/// Internal shared state for the map
struct MapInner<K, V, C> {
    data: DashMap<K, Entry<V>>,
    ttl: Duration,
    clock: C,
    /// Sender to signal shutdown to the sweep task, if one was started
    shutdown_tx: watch::Sender<bool>,
}

/// Thread-safe map whose entries expire a fixed TTL after they were written
///
/// Uses `DashMap` for concurrent access. Every call touches a single shard
/// under its lock, so operations on the same key are totally ordered.
///
/// Expiry is lazy: an entry older than the TTL is removed by whichever read
/// finds it, and an expired entry is never returned. Counting and key listing
/// skip expired entries. A background sweep can be enabled through
/// [`AgingMapConfig::with_sweep_interval`] to also release memory held by keys
/// that are never read again.
///
/// Cloning is cheap and clones share the same entries.
///
/// # Example
///
/// ```rust
/// use aging_map_core::AgingMap;
/// use std::time::Duration;
///
/// let map = AgingMap::new(Duration::from_secs(30));
/// map.set("request:42", "pending");
///
/// assert_eq!(map.get("request:42"), Some("pending"));
///
/// map.remove("request:42");
/// assert_eq!(map.get("request:42"), None);
/// ```
pub struct AgingMap<K, V, C = SystemClock> {
    inner: Arc<MapInner<K, V, C>>,
}

impl<K, V> AgingMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty map that expires entries `ttl` after they are set
    ///
    /// A zero TTL is allowed: every entry is then expired on its next read.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }

    /// Creates an empty map from a TTL in seconds
    ///
    /// # Errors
    ///
    /// Returns `AgingMapError::InvalidTtl` if `seconds` is negative, NaN, or
    /// too large for a `Duration`. No map is constructed in that case.
    pub fn try_from_secs_f64(seconds: f64) -> Result<Self, AgingMapError> {
        Ok(Self::new(ttl_from_secs(seconds)?))
    }
}

impl<K, V> AgingMap<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates an empty map from a configuration
    ///
    /// # Errors
    ///
    /// Returns `AgingMapError::InvalidSweepInterval` for a zero sweep interval,
    /// and `AgingMapError::NoRuntime` when a sweep is requested outside of a
    /// Tokio runtime.
    pub fn with_config(config: AgingMapConfig) -> Result<Self, AgingMapError> {
        Self::with_config_and_clock(config, SystemClock)
    }
}

impl<K, V, C> AgingMap<K, V, C>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    C: Clock + 'static,
{
    /// Creates an empty map from a configuration and a custom clock
    ///
    /// See [`AgingMap::with_config`] for the error conditions.
    pub fn with_config_and_clock(config: AgingMapConfig, clock: C) -> Result<Self, AgingMapError> {
        config.validate()?;

        let runtime = match config.sweep_interval {
            Some(_) => Some(
                tokio::runtime::Handle::try_current().map_err(|_| AgingMapError::NoRuntime)?,
            ),
            None => None,
        };

        let map = Self::with_clock(config.ttl, clock);

        if let (Some(runtime), Some(interval)) = (runtime, config.sweep_interval) {
            let shutdown_rx = map.inner.shutdown_tx.subscribe();
            runtime.spawn(Self::sweep_task(Arc::downgrade(&map.inner), interval, shutdown_rx));
            tracing::debug!(?interval, ttl = ?config.ttl, "aging map sweeper started");
        }

        Ok(map)
    }

    /// Background task that periodically purges expired entries
    ///
    /// Holds only a weak reference so it ends once every map handle is gone.
    async fn sweep_task(
        inner: Weak<MapInner<K, V, C>>,
        interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(inner) = inner.upgrade() else {
                        break;
                    };
                    let removed = Self::purge_internal(&inner);
                    if removed > 0 {
                        tracing::debug!(removed, "swept expired entries");
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("aging map sweeper stopped");
    }
}

impl<K, V, C> AgingMap<K, V, C>
where
    K: Eq + Hash,
    C: Clock,
{
    /// Creates an empty map that reads time from `clock`
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            inner: Arc::new(MapInner {
                data: DashMap::new(),
                ttl,
                clock,
                shutdown_tx,
            }),
        }
    }

    /// Removes every expired entry, returning how many were removed
    fn purge_internal(inner: &MapInner<K, V, C>) -> usize {
        let now = inner.clock.now();
        let mut removed = 0;

        inner.data.retain(|_, entry| {
            if entry.is_expired_at(now, inner.ttl) {
                removed += 1;
                false
            } else {
                true
            }
        });

        removed
    }

    /// The TTL applied to every entry
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Inserts or overwrites the entry for `key`, stamped with the current time
    ///
    /// Any previous entry for `key` is discarded, expired or not.
    pub fn set(&self, key: K, value: V) {
        let entry = Entry::new(value, self.inner.clock.now());
        self.inner.data.insert(key, entry);
    }

    /// Same as [`set`](Self::set), named after `HashMap::insert`
    pub fn insert(&self, key: K, value: V) {
        self.set(key, value);
    }

    /// Stores `value` only if `key` is absent or expired
    ///
    /// Returns `true` if the value was stored. Check and write happen under
    /// one shard lock, so among concurrent callers for the same key exactly
    /// one wins until that entry expires.
    pub fn set_if_absent(&self, key: K, value: V) -> bool {
        let now = self.inner.clock.now();

        match self.inner.data.entry(key) {
            MapEntry::Occupied(occupied) if occupied.get().is_live_at(now, self.inner.ttl) => false,
            MapEntry::Occupied(mut occupied) => {
                occupied.insert(Entry::new(value, now));
                true
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry::new(value, now));
                true
            }
        }
    }

    /// Runs `f` on the live value for `key` without cloning it
    ///
    /// Returns `None` if the key is absent or expired. An expired entry is
    /// removed before returning. Reading never extends an entry's life.
    ///
    /// `f` runs while the key's shard is read-locked and must not write to
    /// this map.
    pub fn get_with<Q, R, F>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> R,
    {
        let now = self.inner.clock.now();
        let ttl = self.inner.ttl;
        let entry = self.inner.data.get(key)?;

        if entry.value().is_expired_at(now, ttl) {
            // Drop the read reference before removing
            drop(entry);
            // Re-check under the write lock so a concurrent overwrite survives
            if self
                .inner
                .data
                .remove_if(key, |_, e| e.is_expired_at(now, ttl))
                .is_some()
            {
                tracing::trace!("evicted expired entry on read");
            }
            return None;
        }

        Some(f(entry.value().value()))
    }

    /// Retrieves a clone of the value for `key`
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    /// Expired entries are removed.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get_with(key, V::clone)
    }

    /// Checks if a key exists and is not expired.
    ///
    /// Expired entries are removed when checked.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_with(key, |_| ()).is_some()
    }

    /// Deletes the entry for `key`, expired or not. Does nothing if absent.
    pub fn remove<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.data.remove(key);
    }

    /// Returns the number of live entries
    ///
    /// Scans every shard; expired entries are not counted.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = self.inner.clock.now();
        self.inner
            .data
            .iter()
            .filter(|entry| entry.value().is_live_at(now, self.inner.ttl))
            .count()
    }

    /// Returns `true` if there are no live entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all keys that are not expired, in no particular order
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let now = self.inner.clock.now();
        self.inner
            .data
            .iter()
            .filter(|entry| entry.value().is_live_at(now, self.inner.ttl))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Deletes all entries
    pub fn clear(&self) {
        self.inner.data.clear();
    }

    /// Removes all expired entries now
    ///
    /// Returns the number of entries removed. The background sweep, when
    /// enabled, calls this on every tick.
    pub fn purge_expired(&self) -> usize {
        Self::purge_internal(&self.inner)
    }

    /// Stops the background sweep, if one is running
    ///
    /// This happens automatically when the last handle is dropped.
    pub fn stop_sweeper(&self) {
        self.inner.shutdown_tx.send_replace(true);
    }

    /// Number of stored entries, expired ones included
    #[cfg(test)]
    fn raw_len(&self) -> usize {
        self.inner.data.len()
    }
}

impl<K, V, C> Clone for AgingMap<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for AgingMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new(AgingMapConfig::default().ttl)
    }
}

impl<K, V, C> Extend<(K, V)> for AgingMap<K, V, C>
where
    K: Eq + Hash,
    C: Clock,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K, V, C> fmt::Debug for AgingMap<K, V, C>
where
    K: Eq + Hash,
    C: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgingMap")
            .field("ttl", &self.inner.ttl)
            .field("live", &self.len())
            .finish()
    }
}

impl<K, V, C> Drop for MapInner<K, V, C> {
    fn drop(&mut self) {
        // Signal the sweep task to stop when the map is dropped
        self.shutdown_tx.send_replace(true);
    }
}

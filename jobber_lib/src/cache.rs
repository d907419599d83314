//! In-memory TTL set of posting URLs backed by `DashMap` for concurrent access.

use dashmap::DashMap;
use std::sync::{Mutex, TryLockError};
use std::time::{Duration, Instant};

/// Thread-safe set of recently seen URLs with time-to-live expiration.
///
/// Shared by every feed task of the process. An expired entry is evicted
/// on the next lookup for that URL, and `insert` sweeps all expired entries
/// at most once per TTL so URLs that are never looked up again do not pile up.
pub struct SeenCache {
    store: DashMap<String, Instant>,
    ttl: Duration,
    next_sweep: Mutex<Instant>,
}

impl SeenCache {
    /// Creates a new cache with the given time-to-live for entries.
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
            next_sweep: Mutex::new(Instant::now() + ttl),
        }
    }

    /// Returns true if `url` was remembered and has not expired.
    pub fn contains(&self, url: &str) -> bool {
        let Some(expires_at) = self.store.get(url).map(|entry| *entry) else {
            return false;
        };
        if Instant::now() > expires_at {
            self.store.remove(url);
            return false;
        }
        true
    }

    /// Remembers `url`, refreshing its expiry if already present.
    pub fn insert(&self, url: &str) {
        let now = Instant::now();
        self.sweep_if_due(now);
        self.store.insert(url.to_string(), now + self.ttl);
    }

    /// Number of entries, including expired ones not yet evicted.
    pub(crate) fn len(&self) -> usize {
        self.store.len()
    }

    fn sweep_if_due(&self, now: Instant) {
        // One insert checks the deadline at a time; concurrent ones skip.
        let mut next_sweep = match self.next_sweep.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) => return,
        };
        if now < *next_sweep {
            return;
        }
        *next_sweep = now + self.ttl;
        drop(next_sweep);

        let before = self.len();
        self.store.retain(|_, expires_at| *expires_at >= now);
        let evicted = before.saturating_sub(self.len());
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.len(), "Swept expired seen URLs");
        }
    }
}

//! Deduplication gate in front of the posting store.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::SeenCache;
use crate::db::StoreError;
use crate::store::PostingStore;

/// How long a confirmed URL is answered from memory before asking the store again.
pub const DEFAULT_SEEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Read-before-write check for already processed postings.
///
/// URLs confirmed as stored are remembered in a process-local cache so
/// repeated runs over the same page skip the store round trip. The gate is
/// only a pre-filter: the store's uniqueness constraint is what prevents
/// duplicates when two runs race past the check.
pub struct DedupeGate {
    store: Arc<dyn PostingStore>,
    seen: SeenCache,
}

impl DedupeGate {
    pub fn new(store: Arc<dyn PostingStore>) -> Self {
        Self {
            store,
            seen: SeenCache::new(DEFAULT_SEEN_TTL),
        }
    }

    /// Returns true if a posting with this exact URL was already handled.
    pub async fn exists(&self, url: &str) -> Result<bool, StoreError> {
        if self.seen.contains(url) {
            return Ok(true);
        }
        let exists = self.store.exists_by_url(url).await?;
        tracing::debug!(url, exists, "Checked posting against store");
        if exists {
            self.seen.insert(url);
        }
        Ok(exists)
    }

    /// Records a URL as handled, after an insert or an insert conflict.
    pub fn remember(&self, url: &str) {
        self.seen.insert(url);
    }
}

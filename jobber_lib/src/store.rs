//! Posting persistence as seen by the pipeline.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::db::{Db, PostingFilter, PostingRow, StoreError};
use crate::types::Posting;

/// Keyed store of postings, shared by concurrent runs.
///
/// `insert` must enforce URL uniqueness itself and report a duplicate as
/// [`StoreError::Conflict`]; callers may race between `exists_by_url` and
/// `insert`.
#[async_trait]
pub trait PostingStore: Send + Sync {
    async fn exists_by_url(&self, url: &str) -> Result<bool, StoreError>;
    async fn insert(&self, posting: &Posting) -> Result<(), StoreError>;
}

/// [`PostingStore`] over a single SQLite connection.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Db>>,
}

impl SqliteStore {
    /// Opens (creating if needed) and migrates the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Db::open(path)?;
        db.init()?;
        Ok(Self::new(db))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db = Db::open_in_memory()?;
        db.init()?;
        Ok(Self::new(db))
    }

    pub fn new(db: Db) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    pub fn posting_count(&self) -> Result<i64, StoreError> {
        self.lock().posting_count()
    }

    pub fn recent_postings(&self, filter: &PostingFilter) -> Result<Vec<PostingRow>, StoreError> {
        self.lock().recent_postings(filter)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Db> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PostingStore for SqliteStore {
    async fn exists_by_url(&self, url: &str) -> Result<bool, StoreError> {
        self.lock().exists_by_url(url)
    }

    async fn insert(&self, posting: &Posting) -> Result<(), StoreError> {
        self.lock().insert_posting(posting)
    }
}

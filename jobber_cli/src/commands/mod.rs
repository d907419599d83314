//! CLI subcommand implementations.

pub mod list;
pub mod once;
pub mod parse;
pub mod run;

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use jobber_lib::config::SLACK_TOKEN_ENV;
use jobber_lib::jobber_fetch::Client;
use jobber_lib::{
    Extractor, JobberConfig, LogNotifier, Notifier, Pipeline, Posting, PostingStore,
    SlackNotifier, SqliteStore, StoreError,
};

pub fn load_config(path: &Path) -> Result<JobberConfig> {
    JobberConfig::load(path).with_context(|| format!("loading config {}", path.display()))
}

/// Builds the pipeline described by `config`.
///
/// A dry run logs messages instead of sending them and keeps new postings
/// in memory, so the database is read but never written.
pub fn build_pipeline(config: &JobberConfig, dry_run: bool) -> Result<Pipeline> {
    let mut client = Client::with_timeout(
        &config.marketplace.base_url,
        &config.marketplace.search_path,
        config.request_timeout(),
    )?;
    for (name, value) in &config.marketplace.headers {
        client = client.with_header(name, value);
    }

    let extractor = Extractor::new(&config.marketplace.base_url)?;
    let sqlite = SqliteStore::open(&config.database)
        .with_context(|| format!("opening database {}", config.database.display()))?;

    let (store, notifier): (Arc<dyn PostingStore>, Arc<dyn Notifier>) = if dry_run {
        (Arc::new(DryRunStore::new(sqlite)), Arc::new(LogNotifier))
    } else {
        let token = config.slack.token.clone().ok_or_else(|| {
            anyhow!(
                "no Slack token: set slack.token or {}, or pass --dry-run",
                SLACK_TOKEN_ENV
            )
        })?;
        let notifier = SlackNotifier::with_base_url(&config.slack.api_url, token)?;
        (Arc::new(sqlite), Arc::new(notifier))
    };

    Ok(Pipeline::new(
        Arc::new(client),
        extractor,
        config.exclusion_rules(),
        store,
        notifier,
    )
    .with_fetch_timeout(config.fetch_timeout()))
}

/// Reads through to the database, writes to memory only.
struct DryRunStore {
    inner: SqliteStore,
    inserted: Mutex<HashSet<String>>,
}

impl DryRunStore {
    fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            inserted: Mutex::new(HashSet::new()),
        }
    }

    fn inserted(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.inserted.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PostingStore for DryRunStore {
    async fn exists_by_url(&self, url: &str) -> Result<bool, StoreError> {
        let pending = self.inserted().contains(url);
        if pending {
            return Ok(true);
        }
        self.inner.exists_by_url(url).await
    }

    async fn insert(&self, posting: &Posting) -> Result<(), StoreError> {
        let conflict = || StoreError::Conflict {
            url: posting.url.clone(),
        };
        if self.inner.exists_by_url(&posting.url).await? {
            return Err(conflict());
        }
        let fresh = self.inserted().insert(posting.url.clone());
        if !fresh {
            return Err(conflict());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobber_lib::PaymentType;

    fn posting(url: &str) -> Posting {
        Posting {
            url: url.to_string(),
            title: "Rust CLI".to_string(),
            description: String::new(),
            skills: Vec::new(),
            duration: "Less than 1 month".to_string(),
            payment_type: PaymentType::Hourly,
            price: "40.00".to_string(),
            search_query: "q=rust".to_string(),
            created_at_utc: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn dry_run_store_never_writes_through() {
        let sqlite = SqliteStore::open_in_memory().unwrap();
        let store = DryRunStore::new(sqlite.clone());

        store.insert(&posting("https://example.com/a")).await.unwrap();

        assert!(store.exists_by_url("https://example.com/a").await.unwrap());
        assert_eq!(sqlite.posting_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn dry_run_store_sees_persisted_postings() {
        let sqlite = SqliteStore::open_in_memory().unwrap();
        sqlite.insert(&posting("https://example.com/a")).await.unwrap();
        let store = DryRunStore::new(sqlite);

        assert!(store.exists_by_url("https://example.com/a").await.unwrap());
        let err = store.insert(&posting("https://example.com/a")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn dry_run_store_rejects_repeat_inserts() {
        let store = DryRunStore::new(SqliteStore::open_in_memory().unwrap());
        store.insert(&posting("https://example.com/b")).await.unwrap();
        let err = store.insert(&posting("https://example.com/b")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }
}

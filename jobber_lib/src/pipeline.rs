//! One scrape run: fetch, extract, filter, dedupe, persist, notify.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::db::StoreError;
use crate::dedupe::DedupeGate;
use crate::error::RunError;
use crate::extract::Extractor;
use crate::fetch::Fetcher;
use crate::format::slack_message;
use crate::notify::Notifier;
use crate::policy::ExclusionRules;
use crate::store::PostingStore;

/// Upper bound on a single fetch, on top of the HTTP client's own timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Counters describing what one run did with each candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Postings the extractor produced.
    pub candidates: usize,
    /// Candidates without a link, skipped.
    pub invalid: usize,
    /// Candidates rejected by an exclusion phrase.
    pub excluded: usize,
    /// Candidates already stored, including insert conflicts.
    pub duplicates: usize,
    pub persisted: usize,
    pub notified: usize,
    pub delivery_failures: usize,
}

/// Drives runs for any (query, destination) pair against shared collaborators.
///
/// A `Pipeline` holds no per-run state, so one instance behind an `Arc`
/// serves every feed concurrently.
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    extractor: Extractor,
    rules: ExclusionRules,
    gate: DedupeGate,
    store: Arc<dyn PostingStore>,
    notifier: Arc<dyn Notifier>,
    fetch_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Extractor,
        rules: ExclusionRules,
        store: Arc<dyn PostingStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            rules,
            gate: DedupeGate::new(store.clone()),
            store,
            notifier,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Runs the pipeline once for `query`, notifying `destination`.
    ///
    /// Fails only when the page cannot be fetched or parsed, or the store
    /// is unavailable. Failed notifications are counted and logged; they do
    /// not undo the insert or stop later candidates.
    pub async fn run(&self, query: &str, destination: &str) -> Result<RunReport, RunError> {
        let html = match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(query)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(query, timeout_secs = self.fetch_timeout.as_secs(), "Fetch timed out");
                return Err(RunError::Transport(jobber_fetch::Error::Timeout));
            }
        };

        let candidates = self.extractor.extract(&html)?;
        let mut report = RunReport {
            candidates: candidates.len(),
            ..RunReport::default()
        };

        for candidate in candidates {
            if candidate.url.is_empty() {
                tracing::debug!(title = %candidate.title, "Skipping posting without link");
                report.invalid += 1;
                continue;
            }

            if let Some(phrase) = self.rules.matching_phrase(&candidate) {
                tracing::debug!(url = %candidate.url, phrase, "Posting excluded");
                report.excluded += 1;
                continue;
            }

            if self.gate.exists(&candidate.url).await? {
                report.duplicates += 1;
                continue;
            }

            let posting = candidate.with_search_query(query);

            match self.store.insert(&posting).await {
                Ok(()) => {
                    self.gate.remember(&posting.url);
                    report.persisted += 1;
                    tracing::info!(url = %posting.url, title = %posting.title, "New posting stored");
                }
                Err(StoreError::Conflict { url }) => {
                    // A concurrent run stored it between our check and insert.
                    tracing::debug!(url = %url, "Posting stored by another run");
                    self.gate.remember(&url);
                    report.duplicates += 1;
                    continue;
                }
                Err(e) => {
                    tracing::error!(url = %posting.url, error = %e, "Failed to store posting");
                    return Err(e.into());
                }
            }

            let message = slack_message(&posting);
            match self.notifier.send(destination, &message).await {
                Ok(()) => report.notified += 1,
                Err(e) => {
                    tracing::warn!(
                        url = %posting.url,
                        destination,
                        error = %e,
                        "Failed to send notification"
                    );
                    report.delivery_failures += 1;
                }
            }
        }

        Ok(report)
    }
}

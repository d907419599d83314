//! Recurring runs, one task per configured feed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

use crate::config::FeedConfig;
use crate::error::RunError;
use crate::pipeline::{Pipeline, RunReport};

/// Result of one run of one feed.
#[derive(Debug)]
pub struct FeedOutcome {
    pub feed: String,
    pub result: Result<RunReport, RunError>,
}

/// Runs every feed through a shared pipeline on a fixed interval.
///
/// Feeds tick independently. A failed or panicking run is logged and the
/// feed runs again on its next tick.
pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    feeds: Vec<FeedConfig>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(pipeline: Arc<Pipeline>, feeds: Vec<FeedConfig>, interval: Duration) -> Self {
        Self {
            pipeline,
            feeds,
            interval,
        }
    }

    /// Runs every feed once, concurrently. Outcomes follow feed order and
    /// include a failed outcome for any run that panicked.
    pub async fn run_once(&self) -> Vec<FeedOutcome> {
        let mut tasks = JoinSet::new();
        for (index, feed) in self.feeds.iter().cloned().enumerate() {
            let pipeline = self.pipeline.clone();
            tasks.spawn(async move { (index, run_isolated(pipeline, feed).await) });
        }

        let mut outcomes = Vec::with_capacity(self.feeds.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!(error = %e, "Feed task failed"),
            }
        }
        outcomes.sort_by_key(|(index, _)| *index);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }

    /// Ticks every feed until `shutdown` resolves. The first tick is immediate.
    ///
    /// On shutdown no new runs start, and runs already in flight finish
    /// before this returns.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();
        for feed in self.feeds.iter().cloned() {
            let pipeline = self.pipeline.clone();
            let interval = self.interval;
            tasks.spawn(feed_loop(pipeline, feed, interval, stop_rx.clone()));
        }
        tracing::info!(
            feeds = self.feeds.len(),
            interval_secs = self.interval.as_secs(),
            "Scheduler started"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, waiting for in-flight runs");
                    break;
                }
                joined = tasks.join_next() => match joined {
                    Some(Err(e)) => tracing::error!(error = %e, "Feed loop exited"),
                    Some(Ok(())) => {}
                    None => {
                        tracing::warn!("No feed loops left");
                        break;
                    }
                },
            }
        }

        let _ = stop_tx.send(true);
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Feed loop exited");
            }
        }
        tracing::info!("Scheduler stopped");
    }
}

async fn feed_loop(
    pipeline: Arc<Pipeline>,
    feed: FeedConfig,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            biased;
            _ = stop.changed() => break,
            _ = ticker.tick() => {}
        }
        let outcome = run_isolated(pipeline.clone(), feed.clone()).await;
        log_outcome(&outcome);
        if *stop.borrow() {
            break;
        }
    }
}

/// Runs one feed in its own task so a panic only loses that run.
async fn run_isolated(pipeline: Arc<Pipeline>, feed: FeedConfig) -> FeedOutcome {
    let name = feed.name.clone();
    match tokio::spawn(async move { run_feed(&pipeline, &feed).await }).await {
        Ok(outcome) => outcome,
        Err(e) => FeedOutcome {
            feed: name,
            result: Err(RunError::Aborted(e.to_string())),
        },
    }
}

async fn run_feed(pipeline: &Pipeline, feed: &FeedConfig) -> FeedOutcome {
    let span = tracing::info_span!("feed", name = %feed.name);
    let result = pipeline
        .run(&feed.query, &feed.channel)
        .instrument(span)
        .await;
    FeedOutcome {
        feed: feed.name.clone(),
        result,
    }
}

fn log_outcome(outcome: &FeedOutcome) {
    match &outcome.result {
        Ok(report) => tracing::info!(
            feed = %outcome.feed,
            candidates = report.candidates,
            persisted = report.persisted,
            notified = report.notified,
            duplicates = report.duplicates,
            excluded = report.excluded,
            delivery_failures = report.delivery_failures,
            "Run complete"
        ),
        Err(e) => tracing::error!(feed = %outcome.feed, error = %e, "Run failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Extractor;
    use crate::fetch::Fetcher;
    use crate::notify::LogNotifier;
    use crate::policy::ExclusionRules;
    use crate::store::SqliteStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ONE_CARD: &str = r#"<html><body><article>
        <a data-test="job-tile-title-link UpLink" href="/jobs/~01slow/">Rust service</a>
        <ul class="job-tile-info-list"><li>Hourly: $50.00</li><li>Expert</li><li>1 to 3 months</li></ul>
    </article></body></html>"#;

    struct CountingFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn fetch(&self, _query: &str) -> Result<String, jobber_fetch::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(jobber_fetch::Error::RequestFailed);
            }
            Ok("<html><body></body></html>".to_string())
        }
    }

    /// Panics for the `q=a` feed, answers every other feed with an empty page.
    struct PanickingFetcher;

    #[async_trait]
    impl Fetcher for PanickingFetcher {
        async fn fetch(&self, query: &str) -> Result<String, jobber_fetch::Error> {
            if query == "q=a" {
                panic!("markup handler blew up");
            }
            Ok("<html><body></body></html>".to_string())
        }
    }

    /// Takes ten seconds to answer with a single job card.
    struct SlowFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for SlowFetcher {
        async fn fetch(&self, _query: &str) -> Result<String, jobber_fetch::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(ONE_CARD.to_string())
        }
    }

    fn feeds() -> Vec<FeedConfig> {
        vec![
            FeedConfig {
                name: "a".to_string(),
                query: "q=a".to_string(),
                channel: "CA".to_string(),
            },
            FeedConfig {
                name: "b".to_string(),
                query: "q=b".to_string(),
                channel: "CB".to_string(),
            },
        ]
    }

    fn scheduler_with_store(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<SqliteStore>,
        feeds: Vec<FeedConfig>,
    ) -> Scheduler {
        let pipeline = Pipeline::new(
            fetcher,
            Extractor::new("https://www.upwork.com").unwrap(),
            ExclusionRules::default(),
            store,
            Arc::new(LogNotifier),
        );
        Scheduler::new(Arc::new(pipeline), feeds, Duration::from_secs(300))
    }

    fn scheduler(fetcher: Arc<dyn Fetcher>) -> Scheduler {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        scheduler_with_store(fetcher, store, feeds())
    }

    #[tokio::test]
    async fn run_once_reports_every_feed_in_order() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let outcomes = scheduler(fetcher.clone()).run_once().await;

        let names: Vec<&str> = outcomes.iter().map(|o| o.feed.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn feeds_tick_on_interval() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        scheduler(fetcher.clone())
            .run_until(tokio::time::sleep(Duration::from_secs(601)))
            .await;

        // Ticks at 0s, 300s and 600s for each of the two feeds.
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_runs_do_not_stop_the_feed() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        scheduler(fetcher.clone())
            .run_until(tokio::time::sleep(Duration::from_secs(601)))
            .await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn run_once_reports_panicked_run_as_failed() {
        let outcomes = scheduler(Arc::new(PanickingFetcher)).run_once().await;

        let names: Vec<&str> = outcomes.iter().map(|o| o.feed.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        match &outcomes[0].result {
            Err(RunError::Aborted(reason)) => assert!(reason.contains("panic")),
            other => panic!("expected aborted run, got {:?}", other),
        }
        assert!(outcomes[1].result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_waits_for_in_flight_run() {
        let fetcher = Arc::new(SlowFetcher {
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let feeds = feeds().into_iter().take(1).collect();
        let scheduler = scheduler_with_store(fetcher.clone(), store.clone(), feeds);

        // Shutdown lands while the first fetch is still sleeping.
        scheduler
            .run_until(tokio::time::sleep(Duration::from_secs(1)))
            .await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.posting_count().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_new_runs_start_after_shutdown() {
        let fetcher = Arc::new(SlowFetcher {
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let feeds = feeds().into_iter().take(1).collect();
        let scheduler = scheduler_with_store(fetcher.clone(), store, feeds);

        scheduler
            .run_until(tokio::time::sleep(Duration::from_secs(1)))
            .await;
        tokio::time::sleep(Duration::from_secs(900)).await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}

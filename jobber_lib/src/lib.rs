//! Library layer for Jobber: job-listing extraction, filtering, dedupe, and alerting.
//!
//! Turns a fetched marketplace search page into [`Posting`]s, drops the ones an
//! [`ExclusionRules`] phrase rejects or the store has already seen, persists
//! the rest, and sends each new posting to a [`Notifier`]. The [`Scheduler`]
//! repeats this per configured feed.

pub mod cache;
pub mod config;
pub mod db;
pub mod dedupe;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod format;
pub mod notify;
pub mod pipeline;
pub mod policy;
pub mod scheduler;
pub mod store;
pub mod types;

pub use jobber_fetch;

pub use cache::SeenCache;
pub use config::{ConfigError, FeedConfig, JobberConfig};
pub use db::{Db, PostingFilter, PostingRow, StoreError};
pub use dedupe::DedupeGate;
pub use error::RunError;
pub use extract::{Extractor, FragmentError, ParseError};
pub use fetch::Fetcher;
pub use format::slack_message;
pub use notify::{DeliveryError, LogNotifier, Notifier, SlackNotifier};
pub use pipeline::{Pipeline, RunReport};
pub use policy::ExclusionRules;
pub use scheduler::{FeedOutcome, Scheduler};
pub use store::{PostingStore, SqliteStore};
pub use types::{PaymentType, Posting};

//! Notification sinks for accepted postings.

pub mod slack;

use async_trait::async_trait;

pub use slack::SlackNotifier;

/// Errors from delivering a message. Logged by the pipeline, never fatal.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("message rejected: {0}")]
    Rejected(String),
}

/// Delivers a rendered message to a destination (a Slack channel id).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, destination: &str, message: &str) -> Result<(), DeliveryError>;
}

/// Notifier that only logs messages. Used for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, destination: &str, message: &str) -> Result<(), DeliveryError> {
        tracing::info!(destination, "Dry run, not sending:\n{}", message);
        Ok(())
    }
}

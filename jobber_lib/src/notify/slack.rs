use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{DeliveryError, Notifier};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts messages through the Slack Web API (`chat.postMessage`) with a bot token.
pub struct SlackNotifier {
    token: String,
    base_url: String,
    http: reqwest::Client,
}

impl SlackNotifier {
    /// Creates a notifier against the public Slack API.
    pub fn new(token: String) -> Result<Self, DeliveryError> {
        Self::with_base_url("https://slack.com/api", token)
    }

    /// Creates a notifier with a custom API base URL (for testing with wiremock).
    pub fn with_base_url(base_url: &str, token: String) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, destination: &str, message: &str) -> Result<(), DeliveryError> {
        let payload = json!({
            "channel": destination,
            "text": message,
            "mrkdwn": true,
            "unfurl_links": false,
        });

        let resp = self
            .http
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        // Slack reports most failures as 200 with `ok: false`.
        let body: PostMessageResponse = resp.json().await?;
        if !body.ok {
            let reason = body.error.unwrap_or_else(|| "unknown_error".to_string());
            return Err(DeliveryError::Rejected(reason));
        }

        Ok(())
    }
}

//! HTTP client for the marketplace job search page.

use std::time::Duration;

use url::Url;

use crate::{query::SearchQuery, user_agent::get_user_agent, Error};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the job search page.
///
/// Sends requests with browser-like headers and a randomized user agent.
/// Responses compressed with gzip or deflate are decoded transparently.
pub struct Client {
    /// Absolute URL of the search page, without query parameters.
    search_url: Url,
    /// Extra headers sent with every request (cookies, client hints).
    headers: Vec<(String, String)>,
    http: reqwest::Client,
}

impl Client {
    /// Creates a client for `{base_url}{search_path}` with a 30-second timeout.
    pub fn new(base_url: &str, search_path: &str) -> Result<Self, Error> {
        Self::with_timeout(base_url, search_path, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(
        base_url: &str,
        search_path: &str,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let search_url = build_search_url(base_url, search_path)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            search_url,
            headers: Vec::new(),
            http,
        })
    }

    /// Adds a header sent with every request.
    ///
    /// `Accept-Encoding` is ignored: setting it by hand would disable the
    /// automatic decompression of the response body.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if name.eq_ignore_ascii_case("accept-encoding") {
            tracing::debug!("Ignoring configured Accept-Encoding header");
            return self;
        }
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Fetches the search page for `query` and returns the decoded HTML.
    pub async fn get_html(&self, query: &SearchQuery) -> Result<String, Error> {
        let url = query.add_to_url(&self.search_url);
        tracing::debug!(url = %url, "Fetching search page");

        let mut request = self
            .http
            .get(url)
            .header("user-agent", get_user_agent())
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "en-US,en;q=0.9")
            .header("upgrade-insecure-requests", "1")
            .header("cache-control", "no-cache")
            .header("pragma", "no-cache");
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::error!("Search page request timed out: {}", e);
                Error::Timeout
            } else {
                tracing::error!("Failed to get search page: {}", e);
                Error::RequestFailed
            }
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout
            } else {
                tracing::error!("Failed to read response body: {}", e);
                Error::RequestFailed
            }
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(body)
    }
}

fn build_search_url(base_url: &str, search_path: &str) -> Result<Url, Error> {
    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        search_path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| Error::InvalidUrl(format!("{}: {}", joined, e)))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}

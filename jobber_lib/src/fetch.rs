//! Source of raw search page markup.

use async_trait::async_trait;
use jobber_fetch::{Client, SearchQuery};

/// Fetches the raw search page for a query string.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<String, jobber_fetch::Error>;
}

#[async_trait]
impl Fetcher for Client {
    async fn fetch(&self, query: &str) -> Result<String, jobber_fetch::Error> {
        self.get_html(&SearchQuery::parse(query)).await
    }
}

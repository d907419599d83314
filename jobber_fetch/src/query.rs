//! Search query parameters for the job search page.

use url::Url;

/// A parsed search query, kept as ordered key/value pairs.
///
/// Feeds are configured with the raw query string copied from the browser
/// (for example `q=azure&sort=recency&t=1`). Values are percent-decoded on
/// parse and re-encoded when appended to the request URL, so both encoded
/// and plain forms of the same query produce the same request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pairs: Vec<(String, String)>,
}

impl SearchQuery {
    /// Parses a raw query string. A leading `?` is ignored; empty segments are dropped.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().trim_start_matches('?');
        let pairs = url::form_urlencoded::parse(raw.as_bytes())
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Self { pairs }
    }

    /// Returns a copy of `url` with this query's parameters appended.
    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        if self.pairs.is_empty() {
            return url;
        }
        {
            let mut serializer = url.query_pairs_mut();
            for (key, value) in &self.pairs {
                serializer.append_pair(key, value);
            }
        }
        url
    }
}

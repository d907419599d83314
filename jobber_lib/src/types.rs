//! Domain types shared by the extractor, store, and formatter.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a posting pays: a fixed budget or an hourly rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    Fixed,
    Hourly,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Fixed => "Fixed",
            PaymentType::Hourly => "Hourly",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(PaymentType::Fixed),
            "hourly" => Ok(PaymentType::Hourly),
            other => Err(format!("unknown payment type: {}", other)),
        }
    }
}

/// One job listing extracted from a search page.
///
/// The URL is the identity of a posting: the same listing surfaced by two
/// different search queries is stored and announced once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub url: String,
    pub title: String,
    pub description: String,
    /// Skill tags in page order, duplicates kept.
    pub skills: Vec<String>,
    /// Raw duration text. Holds the estimated budget for fixed-price work.
    pub duration: String,
    pub payment_type: PaymentType,
    /// Decimal amount (or range) as text, currency symbols removed.
    pub price: String,
    /// Query that surfaced the posting. Empty until the pipeline tags it.
    pub search_query: String,
    pub created_at_utc: DateTime<Utc>,
}

impl Posting {
    /// Tags the posting with the search query of the run that found it.
    pub fn with_search_query(mut self, query: &str) -> Self {
        self.search_query = query.to_string();
        self
    }
}

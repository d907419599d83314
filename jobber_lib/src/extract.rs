//! HTML extraction of job postings from a marketplace search page.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::types::{PaymentType, Posting};

const HOURLY_MARKER: &str = "Hourly";
const FIXED_BUDGET_PREFIX: &str = "Est. budget: ";
const CURRENCY_SYMBOL: char = '$';

const FRAGMENT_SELECTOR: &str = "article";
const TITLE_LINK_SELECTOR: &str = r#"a[data-test~="job-tile-title-link"]"#;
const DESCRIPTION_SELECTOR: &str = r#"p[class*="text-body-sm"]"#;
const INFO_LIST_SELECTOR: &str = r#"ul[class*="job-tile-info-list"]"#;
const INFO_ITEM_SELECTOR: &str = "li";
const SKILL_SELECTOR: &str = r#"button[class="air3-token"]"#;

/// Document-level extraction failures. These abort a run.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("document is empty")]
    EmptyDocument,
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

/// Reasons a single job card is dropped. Never surfaced past the extractor.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FragmentError {
    #[error("job info list not found")]
    MissingInfoList,
    #[error("job info list has {found} items, expected at least 3")]
    TooFewInfoItems { found: usize },
}

struct Selectors {
    fragment: Selector,
    title_link: Selector,
    description: Selector,
    info_list: Selector,
    info_item: Selector,
    skill: Selector,
}

impl Selectors {
    fn compile() -> Result<Self, ParseError> {
        Ok(Self {
            fragment: selector(FRAGMENT_SELECTOR)?,
            title_link: selector(TITLE_LINK_SELECTOR)?,
            description: selector(DESCRIPTION_SELECTOR)?,
            info_list: selector(INFO_LIST_SELECTOR)?,
            info_item: selector(INFO_ITEM_SELECTOR)?,
            skill: selector(SKILL_SELECTOR)?,
        })
    }
}

fn selector(raw: &str) -> Result<Selector, ParseError> {
    Selector::parse(raw).map_err(|e| ParseError::Selector(format!("{}: {}", raw, e)))
}

/// The three fixed-position entries of a job card's info list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    pub price_and_type: String,
    pub experience_level: String,
    pub duration: String,
}

/// Turns search page markup into candidate postings.
pub struct Extractor {
    base_url: Url,
    selectors: Selectors,
}

impl Extractor {
    /// Creates an extractor resolving relative job links against `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ParseError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ParseError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self {
            base_url,
            selectors: Selectors::compile()?,
        })
    }

    /// Extracts every well-formed job card on the page, stamped with the current time.
    pub fn extract(&self, html: &str) -> Result<Vec<Posting>, ParseError> {
        self.extract_at(html, Utc::now())
    }

    /// Extracts job cards, stamping each posting with `now`.
    ///
    /// Cards are parsed one at a time; a card that fails to yield a posting
    /// is logged and skipped without affecting its siblings.
    pub fn extract_at(&self, html: &str, now: DateTime<Utc>) -> Result<Vec<Posting>, ParseError> {
        if html.trim().is_empty() {
            return Err(ParseError::EmptyDocument);
        }

        let document = Html::parse_document(html);
        let fragments: Vec<String> = document
            .select(&self.selectors.fragment)
            .map(|article| article.inner_html())
            .collect();

        let mut postings = Vec::with_capacity(fragments.len());
        for (index, fragment) in fragments.iter().enumerate() {
            match self.extract_fragment(fragment, now) {
                Ok(posting) => postings.push(posting),
                Err(err) => {
                    tracing::debug!(fragment = index, error = %err, "Skipping job card");
                }
            }
        }

        tracing::debug!(
            fragments = fragments.len(),
            postings = postings.len(),
            "Extracted job cards"
        );
        Ok(postings)
    }

    /// Parses one job card in isolation.
    pub fn extract_fragment(
        &self,
        fragment_html: &str,
        now: DateTime<Utc>,
    ) -> Result<Posting, FragmentError> {
        let fragment = Html::parse_fragment(fragment_html);
        let root = fragment.root_element();

        let info = self.job_info(root)?;

        let (title, href) = root
            .select(&self.selectors.title_link)
            .filter_map(|link| {
                let href = link.value().attr("href")?.trim();
                if href.is_empty() {
                    return None;
                }
                Some((element_text(link), href.to_string()))
            })
            .next()
            .unwrap_or_default();

        let description = root
            .select(&self.selectors.description)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let skills = root
            .select(&self.selectors.skill)
            .map(element_text)
            .collect();

        let (payment_type, price) = classify_payment(&info.price_and_type, &info.duration);

        Ok(Posting {
            url: self.resolve_link(&href),
            title,
            description,
            skills,
            duration: info.duration,
            payment_type,
            price,
            search_query: String::new(),
            created_at_utc: now,
        })
    }

    fn job_info(&self, root: ElementRef<'_>) -> Result<JobInfo, FragmentError> {
        let list = root
            .select(&self.selectors.info_list)
            .next()
            .ok_or(FragmentError::MissingInfoList)?;

        let items: Vec<String> = list
            .select(&self.selectors.info_item)
            .map(element_text)
            .collect();
        if items.len() < 3 {
            return Err(FragmentError::TooFewInfoItems { found: items.len() });
        }

        let mut items = items.into_iter();
        Ok(JobInfo {
            price_and_type: items.next().unwrap_or_default(),
            experience_level: items.next().unwrap_or_default(),
            duration: items.next().unwrap_or_default(),
        })
    }

    /// Resolves a card link against the base URL. Empty links stay empty.
    fn resolve_link(&self, href: &str) -> String {
        if href.is_empty() {
            return String::new();
        }
        match self.base_url.join(href) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.base_url.as_str().trim_end_matches('/'), href),
        }
    }
}

/// Derives payment type and price from the first and third info items.
///
/// Fixed-price cards carry their estimated budget in the duration slot,
/// so the fixed price is read from there.
pub fn classify_payment(price_and_type: &str, duration: &str) -> (PaymentType, String) {
    let is_hourly = price_and_type.split(": ").next() == Some(HOURLY_MARKER);
    if is_hourly {
        let amount = price_and_type.rsplit(": ").next().unwrap_or_default();
        (PaymentType::Hourly, amount.replace(CURRENCY_SYMBOL, ""))
    } else {
        let amount = duration.replace(FIXED_BUDGET_PREFIX, "");
        (PaymentType::Fixed, amount.replace(CURRENCY_SYMBOL, ""))
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

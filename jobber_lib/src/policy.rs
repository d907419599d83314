//! Content policy: phrases that disqualify a posting.

use crate::types::Posting;

/// Phrases rejected when no exclusion list is configured.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "only freelances located in the US may apply",
    "united states only",
    "no agencies",
];

/// Case-insensitive substring rules over a posting's title and description.
///
/// Matching is plain substring search on lower-cased text, so a phrase
/// matches anywhere, including inside longer words.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    /// Lower-cased phrases, blanks removed.
    phrases: Vec<String>,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSIONS.iter().copied())
    }
}

impl ExclusionRules {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Returns the first phrase found in `text`, if any.
    pub fn matching_phrase_in(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.phrases
            .iter()
            .find(|phrase| haystack.contains(phrase.as_str()))
            .map(String::as_str)
    }

    /// Returns the phrase that excludes `posting`, checking the title first.
    pub fn matching_phrase(&self, posting: &Posting) -> Option<&str> {
        self.matching_phrase_in(&posting.title)
            .or_else(|| self.matching_phrase_in(&posting.description))
    }

    pub fn accepts(&self, posting: &Posting) -> bool {
        self.matching_phrase(posting).is_none()
    }
}

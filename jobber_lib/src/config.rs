//! YAML configuration: marketplace endpoint, Slack credentials, schedule, feeds.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::policy::ExclusionRules;

/// Environment variable that overrides `slack.token`.
pub const SLACK_TOKEN_ENV: &str = "SLACK_OAUTH_TOKEN";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Complete, immutable process configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JobberConfig {
    pub marketplace: MarketplaceConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Exclusion phrases. `None` means the built-in defaults.
    #[serde(default)]
    pub exclusions: Option<Vec<String>>,
    pub feeds: Vec<FeedConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketplaceConfig {
    pub base_url: String,
    #[serde(default = "default_search_path")]
    pub search_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra request headers (cookies, client hints) copied from a browser session.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_slack_api_url")]
    pub api_url: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_slack_api_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

/// One search query and the Slack channel its new postings go to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub query: String,
    pub channel: String,
}

fn default_database() -> PathBuf {
    PathBuf::from("jobber.db")
}

fn default_search_path() -> String {
    "/nx/search/jobs/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_slack_api_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_interval_secs() -> u64 {
    300
}

fn default_fetch_timeout_secs() -> u64 {
    60
}

impl JobberConfig {
    /// Reads, applies environment overrides to, and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?
            .with_slack_token_override(std::env::var(SLACK_TOKEN_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses YAML without validating.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(content)?)
    }

    /// Replaces the Slack token when `token` is set and non-empty.
    pub fn with_slack_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.slack.token = Some(token);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.marketplace.base_url).map_err(|e| {
            ConfigError::Invalid(format!(
                "marketplace.base_url {:?}: {}",
                self.marketplace.base_url, e
            ))
        })?;
        if self.marketplace.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "marketplace.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.schedule.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "schedule.interval_secs must be greater than 0".into(),
            ));
        }
        if self.schedule.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "schedule.fetch_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.feeds.is_empty() {
            return Err(ConfigError::Invalid("at least one feed is required".into()));
        }

        let mut names = HashSet::new();
        for feed in &self.feeds {
            if feed.name.trim().is_empty() {
                return Err(ConfigError::Invalid("feed name must not be empty".into()));
            }
            if !names.insert(feed.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate feed name: {}",
                    feed.name
                )));
            }
            if feed.query.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "feed {} has an empty query",
                    feed.name
                )));
            }
            if feed.channel.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "feed {} has an empty channel",
                    feed.name
                )));
            }
        }
        Ok(())
    }

    pub fn feed(&self, name: &str) -> Option<&FeedConfig> {
        self.feeds.iter().find(|f| f.name == name)
    }

    pub fn exclusion_rules(&self) -> ExclusionRules {
        match &self.exclusions {
            Some(phrases) => ExclusionRules::new(phrases),
            None => ExclusionRules::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.schedule.fetch_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.marketplace.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
marketplace:
  base_url: https://www.upwork.com
  headers:
    cookie: "visitor_id=abc"
slack:
  token: xoxb-from-file
database: /var/lib/jobber/jobber.db
feeds:
  - name: fixed-azure
    query: "q=azure&sort=recency&t=1"
    channel: C0FIXEDAZ
  - name: hourly-csharp
    query: "q=C%23&sort=recency&t=0&contractor_tier=3"
    channel: C0HOURLYCS
"#;

    #[test]
    fn parses_sample_with_defaults() {
        let config = JobberConfig::from_yaml_str(SAMPLE).unwrap();
        config.validate().unwrap();

        assert_eq!(config.marketplace.search_path, "/nx/search/jobs/");
        assert_eq!(config.marketplace.timeout_secs, 30);
        assert_eq!(
            config.marketplace.headers.get("cookie").map(String::as_str),
            Some("visitor_id=abc")
        );
        assert_eq!(config.slack.api_url, "https://slack.com/api");
        assert_eq!(config.interval(), Duration::from_secs(300));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(60));
        assert_eq!(config.database, PathBuf::from("/var/lib/jobber/jobber.db"));
        assert_eq!(config.feeds.len(), 2);
        assert_eq!(config.feed("hourly-csharp").unwrap().channel, "C0HOURLYCS");
        assert!(config.feed("missing").is_none());
    }

    #[test]
    fn default_exclusions_when_unset() {
        let config = JobberConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.exclusion_rules().phrases().len(), 3);
    }

    #[test]
    fn configured_exclusions_replace_defaults() {
        let yaml = format!("{}exclusions:\n  - \"Onsite only\"\n", SAMPLE);
        let config = JobberConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.exclusion_rules().phrases(), &["onsite only".to_string()]);
    }

    #[test]
    fn env_token_overrides_file() {
        let config = JobberConfig::from_yaml_str(SAMPLE)
            .unwrap()
            .with_slack_token_override(Some("xoxb-from-env".to_string()));
        assert_eq!(config.slack.token.as_deref(), Some("xoxb-from-env"));

        let untouched = JobberConfig::from_yaml_str(SAMPLE)
            .unwrap()
            .with_slack_token_override(Some("  ".to_string()));
        assert_eq!(untouched.slack.token.as_deref(), Some("xoxb-from-file"));
    }

    #[test]
    fn rejects_duplicate_feed_names() {
        let mut config = JobberConfig::from_yaml_str(SAMPLE).unwrap();
        config.feeds[1].name = "fixed-azure".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate feed name"));
    }

    #[test]
    fn rejects_empty_feeds() {
        let mut config = JobberConfig::from_yaml_str(SAMPLE).unwrap();
        config.feeds.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_blank_channel() {
        let mut config = JobberConfig::from_yaml_str(SAMPLE).unwrap();
        config.feeds[0].channel = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_interval() {
        let mut config = JobberConfig::from_yaml_str(SAMPLE).unwrap();
        config.schedule.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_base_url() {
        let mut config = JobberConfig::from_yaml_str(SAMPLE).unwrap();
        config.marketplace.base_url = "upwork.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_marketplace_is_parse_error() {
        let result = JobberConfig::from_yaml_str("feeds: []\n");
        assert!(matches!(result, Err(ConfigError::YamlParse(_))));
    }

    #[test]
    fn example_config_is_valid() {
        let config =
            JobberConfig::from_yaml_str(include_str!("../../jobber.example.yml")).unwrap();
        config.validate().unwrap();
        assert!(config.slack.token.is_none());
        assert!(config.marketplace.headers.is_empty());
        assert_eq!(config.feeds.len(), 2);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = JobberConfig::load("/nonexistent/jobber.yml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

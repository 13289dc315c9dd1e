//! Pipeline configuration.
//!
//! A [`PipelineConfig`] is built once in `main` from three layers, lowest
//! priority first: an optional YAML file, environment variables, then CLI
//! flags. Components receive it (or the part they need) at construction.

use crate::cli::Cli;
use crate::error::{DigestError, Result};
use crate::extract::ExtractionRules;
use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_FEED: &str = "https://www.rtvdrenthe.nl/rss/index.xml";

/// Feature flags for the four analyzer extension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisFlags {
    pub extract_keywords: bool,
    pub summarize_content: bool,
    pub extract_entities: bool,
    pub sentiment_analysis: bool,
}

impl Default for AnalysisFlags {
    fn default() -> Self {
        Self {
            extract_keywords: true,
            summarize_content: true,
            extract_entities: true,
            sentiment_analysis: true,
        }
    }
}

/// Inclusive publication window, in calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// The day before `today`.
    pub fn yesterday_of(today: NaiveDate) -> Self {
        Self::single_day(today.checked_sub_days(Days::new(1)).unwrap_or(today))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub feeds: Vec<String>,
    pub storage_dir: PathBuf,
    pub min_article_length: usize,
    pub max_articles_per_feed: usize,
    pub request_timeout_secs: u64,
    pub analysis: AnalysisFlags,
    pub extraction: ExtractionRules,
    /// `None` means "yesterday", resolved at run time.
    pub window: Option<DateWindow>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feeds: vec![DEFAULT_FEED.to_string()],
            storage_dir: PathBuf::from("storage"),
            min_article_length: 100,
            max_articles_per_feed: 50,
            request_timeout_secs: 15,
            analysis: AnalysisFlags::default(),
            extraction: ExtractionRules::default(),
            window: None,
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DigestError::io(path, e))?;
        let config = Self::from_yaml_str(&content)?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Resolve the full configuration: file, then environment, then CLI.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_yaml_file(Path::new(path))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_cli(cli);
        config.validate()?;
        debug!(?config, "Resolved configuration");
        Ok(config)
    }

    /// Apply environment overrides through `lookup`, so tests can supply a
    /// map instead of touching the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("STORAGE_DIR") {
            self.storage_dir = PathBuf::from(dir);
        }
        if let Some(v) = lookup("MIN_ARTICLE_LENGTH") {
            self.min_article_length = parse_env_number("MIN_ARTICLE_LENGTH", &v)?;
        }
        if let Some(v) = lookup("MAX_ARTICLES_PER_FEED") {
            self.max_articles_per_feed = parse_env_number("MAX_ARTICLES_PER_FEED", &v)?;
        }
        let flags = &mut self.analysis;
        for (key, slot) in [
            ("EXTRACT_KEYWORDS", &mut flags.extract_keywords),
            ("SUMMARIZE_CONTENT", &mut flags.summarize_content),
            ("EXTRACT_ENTITIES", &mut flags.extract_entities),
            ("SENTIMENT_ANALYSIS", &mut flags.sentiment_analysis),
        ] {
            if let Some(v) = lookup(key) {
                *slot = v.trim().eq_ignore_ascii_case("true");
            }
        }
        Ok(())
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if !cli.feeds.is_empty() {
            self.feeds = cli.feeds.clone();
        }
        if let Some(dir) = &cli.storage_dir {
            self.storage_dir = PathBuf::from(dir);
        }
        if let Some(n) = cli.min_article_length {
            self.min_article_length = n;
        }
        if let Some(n) = cli.max_articles_per_feed {
            self.max_articles_per_feed = n;
        }
        if let Some(day) = cli.date {
            self.window = Some(DateWindow::single_day(day));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.feeds.iter().all(|f| f.trim().is_empty()) {
            return Err(DigestError::Config("feed list is empty".into()));
        }
        if self.max_articles_per_feed == 0 {
            return Err(DigestError::Config(
                "max_articles_per_feed must be at least 1".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(DigestError::Config(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if let Some(w) = self.window {
            if w.end < w.start {
                return Err(DigestError::Config(format!(
                    "window end {} precedes start {}",
                    w.end, w.start
                )));
            }
        }
        Ok(())
    }

    /// The configured window, or yesterday relative to the local clock.
    pub fn resolved_window(&self) -> DateWindow {
        self.window
            .unwrap_or_else(|| DateWindow::yesterday_of(Local::now().date_naive()))
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.storage_dir.join("processed_articles")
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.storage_dir.join("raw_articles")
    }
}

fn parse_env_number(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| DigestError::Config(format!("{key} must be a non-negative integer, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_reference_values() {
        let c = PipelineConfig::default();
        assert_eq!(c.feeds, vec![DEFAULT_FEED.to_string()]);
        assert_eq!(c.min_article_length, 100);
        assert_eq!(c.max_articles_per_feed, 50);
        assert_eq!(c.processed_dir(), PathBuf::from("storage/processed_articles"));
        assert!(c.analysis.extract_keywords && c.analysis.sentiment_analysis);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn yaml_partial_keeps_defaults() {
        let yaml = r#"
feeds:
  - https://example.com/feed.xml
min_article_length: 40
analysis:
  sentiment_analysis: false
window:
  start: 2025-05-06
  end: 2025-05-06
"#;
        let c = PipelineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(c.feeds, vec!["https://example.com/feed.xml".to_string()]);
        assert_eq!(c.min_article_length, 40);
        assert_eq!(c.max_articles_per_feed, 50);
        assert!(!c.analysis.sentiment_analysis);
        assert!(c.analysis.extract_entities);
        let day = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        assert_eq!(c.resolved_window(), DateWindow::single_day(day));
        assert!(!c.extraction.strategies.is_empty());
    }

    #[test]
    fn env_overrides_numbers_and_flags() {
        let mut c = PipelineConfig::default();
        c.apply_env(env(&[
            ("STORAGE_DIR", "/data"),
            ("MAX_ARTICLES_PER_FEED", "5"),
            ("EXTRACT_KEYWORDS", "False"),
            ("SUMMARIZE_CONTENT", "TRUE"),
        ]))
        .unwrap();
        assert_eq!(c.storage_dir, PathBuf::from("/data"));
        assert_eq!(c.max_articles_per_feed, 5);
        assert!(!c.analysis.extract_keywords);
        assert!(c.analysis.summarize_content);
    }

    #[test]
    fn env_rejects_non_numeric() {
        let mut c = PipelineConfig::default();
        let err = c
            .apply_env(env(&[("MIN_ARTICLE_LENGTH", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("MIN_ARTICLE_LENGTH"));
    }

    #[test]
    fn cli_overrides_everything() {
        let cli = Cli::parse_from([
            "feed_digest",
            "--feed",
            "https://a.example/rss",
            "--feed",
            "https://b.example/rss",
            "--date",
            "2025-05-06",
            "--max-articles-per-feed",
            "3",
        ]);
        let mut c = PipelineConfig::default();
        c.apply_cli(&cli);
        assert_eq!(c.feeds.len(), 2);
        assert_eq!(c.max_articles_per_feed, 3);
        assert_eq!(
            c.window,
            Some(DateWindow::single_day(
                NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()
            ))
        );
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut c = PipelineConfig::default();
        c.feeds.clear();
        assert!(c.validate().is_err());

        let mut c = PipelineConfig::default();
        c.max_articles_per_feed = 0;
        assert!(c.validate().is_err());

        let mut c = PipelineConfig::default();
        c.window = Some(DateWindow {
            start: NaiveDate::from_ymd_opt(2025, 5, 7).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
        });
        assert!(c.validate().is_err());
    }

    #[test]
    fn yesterday_of_crosses_month_boundary() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let w = DateWindow::yesterday_of(today);
        assert_eq!(w.start, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(w.start, w.end);
    }
}

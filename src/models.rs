//! Data models flowing through the digest pipeline.
//!
//! - [`FeedEntry`]: one raw item as parsed from an RSS or Atom document
//! - [`ExtractionResult`]: recovered text plus the [`Provenance`] tier it came from
//! - [`AnalysisResult`]: statistics and optional analyzer outputs
//! - [`Article`]: the persisted record, appended to the daily batch
//!
//! Field names on the persisted types match the JSON written to disk.

use crate::fallback::first_present;
use serde::{Deserialize, Serialize};

/// A raw feed item. Nothing here is persisted as-is.
///
/// Date and content fields are kept separately per source element so the
/// lookup order stays explicit at the call site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    /// Atom `<published>`.
    pub published: Option<String>,
    /// RSS `<pubDate>`.
    pub pub_date: Option<String>,
    /// Atom `<updated>`.
    pub updated: Option<String>,
    /// Dublin Core `<dc:date>`.
    pub dc_date: Option<String>,
    /// `<content:encoded>` or Atom `<content>`.
    pub content: Option<String>,
    /// Atom `<summary>`.
    pub summary: Option<String>,
    /// RSS `<description>`.
    pub description: Option<String>,
}

impl FeedEntry {
    /// The raw published-date string and the field it came from.
    pub fn published_raw(&self) -> Option<(&'static str, &str)> {
        first_present([
            ("published", self.published.as_deref()),
            ("pubDate", self.pub_date.as_deref()),
            ("updated", self.updated.as_deref()),
            ("dc:date", self.dc_date.as_deref()),
        ])
    }

    /// The feed's own copy of the article body: rich content, then summary,
    /// then description.
    pub fn embedded_content(&self) -> Option<(&'static str, &str)> {
        first_present([
            ("content", self.content.as_deref()),
            ("summary", self.summary.as_deref()),
            ("description", self.description.as_deref()),
        ])
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// Fallback tier an article's text was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    PagePrimary,
    PageFallbackSelector,
    FeedEmbedded,
    Empty,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::PagePrimary => "page-primary",
            Provenance::PageFallbackSelector => "page-fallback-selector",
            Provenance::FeedEmbedded => "feed-embedded",
            Provenance::Empty => "empty",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub text: String,
    pub provenance: Provenance,
}

impl ExtractionResult {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            provenance: Provenance::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.provenance == Provenance::Empty || self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicStats {
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_words_per_sentence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: String,
    pub score: f64,
}

/// Analysis attached to an article. Serializes as `{}` when nothing was
/// computed (text shorter than the configured minimum).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_stats: Option<BasicStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<NamedEntity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.basic_stats.is_none()
            && self.keywords.is_none()
            && self.summary.is_none()
            && self.entities.is_none()
            && self.sentiment.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub processed_at: String,
    pub word_count: usize,
    pub sentence_count: usize,
    pub unique_words: usize,
    pub language: String,
    pub difficulty_level: String,
    pub provenance: Provenance,
}

/// One processed article, as stored in the daily batch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    /// The feed's date string, verbatim.
    pub published: String,
    pub feed_url: String,
    pub content: String,
    pub analysis: AnalysisResult,
    pub metadata: ArticleMetadata,
}

//! Builds the persisted [`Article`] record.

use crate::analyze::basic_stats;
use crate::models::{AnalysisResult, Article, ArticleMetadata, FeedEntry, Provenance};
use chrono::{DateTime, Local, SecondsFormat};
use itertools::Itertools;

pub const LANGUAGE: &str = "nl";
pub const DIFFICULTY_UNKNOWN: &str = "unknown";

/// Cleaned text and where it came from.
#[derive(Debug, Clone)]
pub struct CleanContent {
    pub text: String,
    pub provenance: Provenance,
}

#[derive(Debug, Clone)]
pub struct ArticleAssembler {
    language: String,
}

impl Default for ArticleAssembler {
    fn default() -> Self {
        Self {
            language: LANGUAGE.to_string(),
        }
    }
}

impl ArticleAssembler {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// Combine entry metadata, cleaned content and analysis.
    ///
    /// Returns `None` when the content is empty; such entries are discarded.
    pub fn assemble(
        &self,
        entry: &FeedEntry,
        feed_url: &str,
        content: CleanContent,
        analysis: AnalysisResult,
        processed_at: DateTime<Local>,
    ) -> Option<Article> {
        if content.text.trim().is_empty() {
            return None;
        }
        let text = content.text;

        let sentence_count = match &analysis.basic_stats {
            Some(stats) => stats.sentence_count,
            None => basic_stats(&text).sentence_count,
        };
        let unique_words = text
            .split_whitespace()
            .map(str::to_lowercase)
            .unique()
            .count();

        let metadata = ArticleMetadata {
            processed_at: processed_at.to_rfc3339_opts(SecondsFormat::Secs, false),
            word_count: text.split_whitespace().count(),
            sentence_count,
            unique_words,
            language: self.language.clone(),
            difficulty_level: DIFFICULTY_UNKNOWN.to_string(),
            provenance: content.provenance,
        };

        Some(Article {
            title: entry.title.as_deref().map(str::trim).unwrap_or_default().to_string(),
            link: entry.link().unwrap_or_default().to_string(),
            published: entry
                .published_raw()
                .map(|(_, raw)| raw.to_string())
                .unwrap_or_default(),
            feed_url: feed_url.to_string(),
            content: text,
            analysis,
            metadata,
        })
    }
}

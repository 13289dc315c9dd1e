//! Text statistics and pluggable analyzers.
//!
//! [`ContentAnalyzer`] always computes [`BasicStats`] for long-enough text.
//! Keywords, summary, entities and sentiment come from [`Analyzer`] plugins,
//! each gated by its flag in [`AnalysisFlags`]. The default registry holds a
//! no-op plugin per capability, so those fields stay absent until a real
//! implementation is registered with [`ContentAnalyzer::with_analyzer`].

use crate::config::AnalysisFlags;
use crate::models::{AnalysisResult, BasicStats, NamedEntity, Sentiment};
use std::fmt;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Keywords,
    Summary,
    Entities,
    Sentiment,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Keywords,
        Capability::Summary,
        Capability::Entities,
        Capability::Sentiment,
    ];

    pub fn enabled(self, flags: &AnalysisFlags) -> bool {
        match self {
            Capability::Keywords => flags.extract_keywords,
            Capability::Summary => flags.summarize_content,
            Capability::Entities => flags.extract_entities,
            Capability::Sentiment => flags.sentiment_analysis,
        }
    }
}

/// What a plugin contributes to an [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerOutput {
    Keywords(Vec<String>),
    Summary(String),
    Entities(Vec<NamedEntity>),
    Sentiment(Sentiment),
}

impl AnalyzerOutput {
    fn merge_into(self, result: &mut AnalysisResult) {
        match self {
            AnalyzerOutput::Keywords(k) => result.keywords = Some(k),
            AnalyzerOutput::Summary(s) => result.summary = Some(s),
            AnalyzerOutput::Entities(e) => result.entities = Some(e),
            AnalyzerOutput::Sentiment(s) => result.sentiment = Some(s),
        }
    }
}

/// An analysis extension point.
pub trait Analyzer: fmt::Debug + Send + Sync {
    fn capability(&self) -> Capability;

    /// `None` means the analyzer has nothing to add for this text.
    fn analyze(&self, text: &str) -> Option<AnalyzerOutput>;
}

/// Placeholder for a capability with no implementation yet.
#[derive(Debug, Clone, Copy)]
pub struct NoopAnalyzer(pub Capability);

impl Analyzer for NoopAnalyzer {
    fn capability(&self) -> Capability {
        self.0
    }

    fn analyze(&self, _text: &str) -> Option<AnalyzerOutput> {
        None
    }
}

/// Word, sentence and words-per-sentence counts using Unicode segmentation.
pub fn basic_stats(text: &str) -> BasicStats {
    let word_count = text.unicode_words().count();
    let sentence_count = text
        .unicode_sentences()
        .filter(|s| s.chars().any(char::is_alphanumeric))
        .count();
    let avg_words_per_sentence = if sentence_count == 0 {
        0.0
    } else {
        word_count as f64 / sentence_count as f64
    };
    BasicStats {
        word_count,
        sentence_count,
        avg_words_per_sentence,
    }
}

pub struct ContentAnalyzer {
    min_words: usize,
    flags: AnalysisFlags,
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl fmt::Debug for ContentAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentAnalyzer")
            .field("min_words", &self.min_words)
            .field("flags", &self.flags)
            .field("analyzers", &self.analyzers)
            .finish()
    }
}

impl ContentAnalyzer {
    pub fn new(min_words: usize, flags: AnalysisFlags) -> Self {
        let analyzers = Capability::ALL
            .into_iter()
            .map(|c| Box::new(NoopAnalyzer(c)) as Box<dyn Analyzer>)
            .collect();
        Self {
            min_words,
            flags,
            analyzers,
        }
    }

    /// Register `analyzer`, replacing any existing one for its capability.
    pub fn with_analyzer(mut self, analyzer: impl Analyzer + 'static) -> Self {
        let capability = analyzer.capability();
        self.analyzers.retain(|a| a.capability() != capability);
        self.analyzers.push(Box::new(analyzer));
        self
    }

    /// Analyze normalized text. Text with fewer than the minimum number of
    /// whitespace-separated words gets an empty result.
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        let words = text.split_whitespace().count();
        if words < self.min_words {
            debug!(words, min = self.min_words, "Text below analysis threshold");
            return AnalysisResult::default();
        }

        let mut result = AnalysisResult {
            basic_stats: Some(basic_stats(text)),
            ..AnalysisResult::default()
        };
        for analyzer in &self.analyzers {
            let capability = analyzer.capability();
            if !capability.enabled(&self.flags) {
                continue;
            }
            if let Some(output) = analyzer.analyze(text) {
                debug!(?capability, "Analyzer contributed output");
                output.merge_into(&mut result);
            }
        }
        result
    }
}

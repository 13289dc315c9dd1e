//! Feed-to-batch orchestration.
//!
//! Feeds are processed one after another, entries within a feed one after
//! another, and each entry runs filter → extract → normalize → analyze →
//! assemble → store to completion before the next starts. Nothing short of
//! a configuration problem stops a run: failed feeds and entries are logged,
//! counted in the [`RunReport`], and skipped.

use crate::analyze::{Analyzer, ContentAnalyzer};
use crate::assemble::{ArticleAssembler, CleanContent};
use crate::config::PipelineConfig;
use crate::date_window::{DateWindowFilter, WindowCheck};
use crate::error::{ErrorCategory, Result};
use crate::extract::ContentExtractor;
use crate::feed::fetch_feed;
use crate::http::build_client;
use crate::models::{FeedEntry, Provenance};
use crate::normalize::normalize;
use crate::store::DailyBatchStore;
use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// What happened to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    OutsideWindow,
    NoContent,
    Stored(Provenance),
    StoreFailed,
}

/// Per-feed counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedReport {
    pub feed_url: String,
    /// Set when the feed could not be fetched or parsed.
    pub error: Option<String>,
    pub examined: usize,
    pub outside_window: usize,
    pub no_content: usize,
    pub stored: usize,
    pub store_failures: usize,
}

impl FeedReport {
    fn new(feed_url: &str) -> Self {
        Self {
            feed_url: feed_url.to_string(),
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: EntryOutcome) {
        self.examined += 1;
        match outcome {
            EntryOutcome::OutsideWindow => self.outside_window += 1,
            EntryOutcome::NoContent => self.no_content += 1,
            EntryOutcome::Stored(_) => self.stored += 1,
            EntryOutcome::StoreFailed => self.store_failures += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub feeds: Vec<FeedReport>,
    pub by_provenance: BTreeMap<Provenance, usize>,
    pub legacy_removed: usize,
}

impl RunReport {
    pub fn stored(&self) -> usize {
        self.feeds.iter().map(|f| f.stored).sum()
    }

    pub fn failed_feeds(&self) -> usize {
        self.feeds.iter().filter(|f| f.error.is_some()).count()
    }
}

pub struct Pipeline {
    feeds: Vec<String>,
    max_articles_per_feed: usize,
    client: reqwest::Client,
    filter: DateWindowFilter,
    extractor: ContentExtractor,
    analyzer: ContentAnalyzer,
    assembler: ArticleAssembler,
    store: DailyBatchStore,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("feeds", &self.feeds)
            .field("max_articles_per_feed", &self.max_articles_per_feed)
            .field("window", &self.filter.window())
            .field("store", &self.store.dir())
            .finish()
    }
}

impl Pipeline {
    /// Build every component from one configuration.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let client = build_client(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self {
            feeds: config
                .feeds
                .iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
            max_articles_per_feed: config.max_articles_per_feed,
            filter: DateWindowFilter::new(config.resolved_window()),
            extractor: ContentExtractor::new(client.clone(), config.extraction.clone()),
            analyzer: ContentAnalyzer::new(config.min_article_length, config.analysis),
            assembler: ArticleAssembler::default(),
            store: DailyBatchStore::new(config.processed_dir()),
            client,
        })
    }

    /// Register an analysis plugin.
    pub fn with_analyzer(mut self, analyzer: impl Analyzer + 'static) -> Self {
        self.analyzer = self.analyzer.with_analyzer(analyzer);
        self
    }

    pub fn store(&self) -> &DailyBatchStore {
        &self.store
    }

    /// Run against today's batch, by the local clock.
    pub async fn run(&self) -> RunReport {
        self.run_on(Local::now().date_naive()).await
    }

    /// Run every configured feed once.
    ///
    /// Legacy per-article files are reconciled first, then feeds are
    /// processed in order. A feed that cannot be fetched or parsed is
    /// recorded in the report and the run moves on to the next one.
    ///
    /// # Arguments
    ///
    /// * `today` - Processing day; names the batch file articles are appended to
    ///
    /// # Returns
    ///
    /// A [`RunReport`] with per-feed counters and per-provenance totals.
    #[instrument(level = "info", skip_all, fields(%today, window = ?self.filter.window()))]
    pub async fn run_on(&self, today: NaiveDate) -> RunReport {
        let mut report = RunReport::default();

        match self.store.reconcile_legacy_files(today).await {
            Ok(n) => report.legacy_removed = n,
            Err(e) => warn!(error = %e, category = %e.category(), "Legacy file cleanup failed"),
        }

        for feed_url in &self.feeds {
            let feed_report = self.process_feed(feed_url, today, &mut report.by_provenance).await;
            report.feeds.push(feed_report);
        }

        info!(
            feeds = report.feeds.len(),
            failed_feeds = report.failed_feeds(),
            stored = report.stored(),
            "Run complete"
        );
        report
    }

    #[instrument(level = "info", skip_all, fields(feed_url = %feed_url))]
    async fn process_feed(
        &self,
        feed_url: &str,
        today: NaiveDate,
        by_provenance: &mut BTreeMap<Provenance, usize>,
    ) -> FeedReport {
        let mut report = FeedReport::new(feed_url);
        info!("Processing feed");

        let entries = match fetch_feed(&self.client, feed_url).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, category = %e.category(), "Skipping feed");
                report.error = Some(e.to_string());
                return report;
            }
        };

        for entry in &entries {
            if report.stored >= self.max_articles_per_feed {
                info!(max = self.max_articles_per_feed, "Per-feed article cap reached");
                break;
            }
            let outcome = self.process_entry(entry, feed_url, today).await;
            if let EntryOutcome::Stored(provenance) = outcome {
                *by_provenance.entry(provenance).or_insert(0) += 1;
            }
            report.record(outcome);
        }

        info!(
            examined = report.examined,
            outside_window = report.outside_window,
            no_content = report.no_content,
            stored = report.stored,
            "Processed {} articles from {}",
            report.stored,
            feed_url
        );
        report
    }

    /// Take one entry through the whole chain.
    pub async fn process_entry(
        &self,
        entry: &FeedEntry,
        feed_url: &str,
        today: NaiveDate,
    ) -> EntryOutcome {
        let title = entry.title.as_deref().unwrap_or("");
        match self.filter.check(entry) {
            WindowCheck::Inside(_) => {}
            WindowCheck::MissingDate | WindowCheck::Unparseable(_) => {
                debug!(title, category = %ErrorCategory::Entry, "Entry skipped: no usable date");
                return EntryOutcome::OutsideWindow;
            }
            WindowCheck::Outside(_) => return EntryOutcome::OutsideWindow,
        }

        let extracted = self.extractor.extract(entry).await;
        let text = normalize(&extracted.text);
        if text.is_empty() {
            warn!(
                title,
                link = entry.link().unwrap_or(""),
                category = %ErrorCategory::Entry,
                "No content recovered; discarding entry"
            );
            return EntryOutcome::NoContent;
        }

        let analysis = self.analyzer.analyze(&text);
        let provenance = extracted.provenance;
        let content = CleanContent { text, provenance };
        let Some(article) = self
            .assembler
            .assemble(entry, feed_url, content, analysis, Local::now())
        else {
            return EntryOutcome::NoContent;
        };

        match self.store.append(&article, today).await {
            Ok(_) => EntryOutcome::Stored(provenance),
            Err(e) => {
                error!(title, error = %e, category = %e.category(), "Failed to store article");
                EntryOutcome::StoreFailed
            }
        }
    }
}

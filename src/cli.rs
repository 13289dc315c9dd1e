//! Command-line interface definitions for Feed Digest.
//!
//! Every flag is optional: anything not given here falls back to the YAML
//! file passed with `--config`, then to environment variables, then to the
//! built-in defaults (see [`crate::config::PipelineConfig`]).

use chrono::NaiveDate;
use clap::Parser;

/// Command-line arguments for the Feed Digest application.
///
/// # Examples
///
/// ```sh
/// # Process yesterday's items from the default feed
/// feed_digest
///
/// # Explicit feeds, storage location and day
/// feed_digest --feed https://example.com/rss --storage-dir ./storage --date 2025-05-06
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Feed URL to process (repeatable; replaces the configured list)
    #[arg(short, long = "feed")]
    pub feeds: Vec<String>,

    /// Root storage directory
    #[arg(short, long)]
    pub storage_dir: Option<String>,

    /// Minimum word count before statistics are computed
    #[arg(long)]
    pub min_article_length: Option<usize>,

    /// Maximum number of articles stored per feed
    #[arg(long)]
    pub max_articles_per_feed: Option<usize>,

    /// Publication day to collect (YYYY-MM-DD); defaults to yesterday
    #[arg(short, long)]
    pub date: Option<NaiveDate>,
}

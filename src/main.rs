//! # Feed Digest
//!
//! Command-line entry point: resolves configuration, prepares the storage
//! directories, and runs the pipeline once.
//!
//! ## Usage
//!
//! ```sh
//! feed_digest --config config.yaml
//! RUST_LOG=debug feed_digest --feed https://example.com/rss --date 2025-05-06
//! ```

use clap::Parser;
use feed_digest::cli::Cli;
use feed_digest::config::PipelineConfig;
use feed_digest::pipeline::Pipeline;
use feed_digest::utils::ensure_writable_dir;
use std::error::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("feed_digest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = match PipelineConfig::load(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, category = %e.category(), "Invalid configuration");
            return Err(e.into());
        }
    };
    let window = config.resolved_window();
    info!(
        feeds = config.feeds.len(),
        start = %window.start,
        end = %window.end,
        storage_dir = %config.storage_dir.display(),
        "Configuration loaded"
    );

    // Early check: ensure storage dirs are writable
    for dir in [config.processed_dir(), config.raw_dir()] {
        if let Err(e) = ensure_writable_dir(&dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "Storage directory is not writable (fix perms or choose a different path)"
            );
            return Err(e.into());
        }
    }

    let pipeline = Pipeline::new(&config)?;
    let report = pipeline.run().await;

    for feed in &report.feeds {
        match &feed.error {
            Some(reason) => warn!(feed_url = %feed.feed_url, %reason, "Feed skipped"),
            None => info!(
                feed_url = %feed.feed_url,
                examined = feed.examined,
                stored = feed.stored,
                outside_window = feed.outside_window,
                no_content = feed.no_content,
                store_failures = feed.store_failures,
                "Feed summary"
            ),
        }
    }
    for (provenance, count) in &report.by_provenance {
        info!(%provenance, count, "Articles by provenance");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        stored = report.stored(),
        legacy_removed = report.legacy_removed,
        "Execution complete"
    );

    Ok(())
}

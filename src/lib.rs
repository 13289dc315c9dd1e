//! # Feed Digest
//!
//! Collects the previous day's items from syndication feeds, recovers each
//! article's full text from its web page, and appends the cleaned results to
//! a per-day JSON batch.
//!
//! ## Architecture
//!
//! For each configured feed, entries pass through:
//! 1. **Date window** ([`date_window`]): keep only entries published on the target day
//! 2. **Extraction** ([`extract`]): fetch the page and locate the article body,
//!    falling back to the feed's own content, summary or description
//! 3. **Normalization** ([`normalize`]): strip markup and collapse whitespace
//! 4. **Analysis** ([`analyze`]): basic statistics plus pluggable analyzers
//! 5. **Assembly** ([`assemble`]): build the persisted [`models::Article`]
//! 6. **Storage** ([`store`]): append to the day's batch file
//!
//! [`pipeline::Pipeline`] wires these together from a
//! [`config::PipelineConfig`].

pub mod analyze;
pub mod assemble;
pub mod cli;
pub mod config;
pub mod date_window;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod feed;
pub mod http;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod store;
pub mod utils;

pub use error::{DigestError, Result};

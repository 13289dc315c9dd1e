//! Error taxonomy for the digest pipeline.
//!
//! Every failure is tagged with the stage it belongs to so the pipeline can
//! decide whether to skip a feed, skip an entry, or start from an empty batch.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed feed: {0}")]
    MalformedFeed(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Which part of a run an error affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Feed,
    Entry,
    Storage,
    Config,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Feed => "feed",
            ErrorCategory::Entry => "entry",
            ErrorCategory::Storage => "storage",
            ErrorCategory::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DigestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DigestError::Io {
            path: path.into(),
            source,
        }
    }

    /// Network and status errors are classified as feed-level because the
    /// only place they escape as `Err` is the feed fetch; page fetch failures
    /// are absorbed by the extractor.
    pub fn category(&self) -> ErrorCategory {
        match self {
            DigestError::Http(_)
            | DigestError::Status { .. }
            | DigestError::Xml(_)
            | DigestError::MalformedFeed(_) => ErrorCategory::Feed,
            DigestError::Io { .. } | DigestError::Json(_) => ErrorCategory::Storage,
            DigestError::Yaml(_) | DigestError::Config(_) => ErrorCategory::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;

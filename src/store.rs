//! Daily batch persistence.
//!
//! All articles processed on one calendar day (of processing, not of
//! publication) live in a single pretty-printed JSON array:
//!
//! ```text
//! storage/processed_articles/
//! ├── articles_20250506.json
//! └── articles_20250507.json
//! ```
//!
//! Appending is a whole-file read-modify-write. Appends through one store
//! are serialized by an in-process lock; separate processes writing the
//! same day's file still race.

use crate::error::{DigestError, Result};
use crate::models::Article;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

static BATCH_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^articles_\d{8}\.json$").expect("static regex"));

#[derive(Debug)]
pub struct DailyBatchStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl DailyBatchStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn batch_file_name(day: NaiveDate) -> String {
        format!("articles_{}.json", day.format("%Y%m%d"))
    }

    pub fn batch_path(&self, day: NaiveDate) -> PathBuf {
        self.dir.join(Self::batch_file_name(day))
    }

    /// Existing records of a batch file. A missing file is an empty batch; an
    /// unreadable or non-array file is logged and treated as empty.
    async fn load_records(path: &Path) -> Result<Vec<Value>> {
        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DigestError::io(path, e)),
        };
        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    category = "storage",
                    "Existing batch file is corrupt; starting from an empty batch"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Append an article to the batch file for a processing day.
    ///
    /// The file is read, extended by one record and rewritten as a
    /// pretty-printed JSON array. A missing file starts a new batch; a corrupt
    /// one is logged and replaced.
    ///
    /// # Arguments
    ///
    /// * `article` - The record to append
    /// * `day` - Processing day that names the file (`articles_YYYYMMDD.json`)
    ///
    /// # Returns
    ///
    /// The number of records in the batch after the append.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Io`] if the directory or file cannot be
    /// written, or [`DigestError::Json`] if the article cannot be serialized.
    #[instrument(level = "info", skip_all, fields(%day, title = %article.title))]
    pub async fn append(&self, article: &Article, day: NaiveDate) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DigestError::io(&self.dir, e))?;

        let path = self.batch_path(day);
        let mut records = Self::load_records(&path).await?;
        records.push(serde_json::to_value(article)?);

        let json = serde_json::to_string_pretty(&records)?;
        fs::write(&path, json)
            .await
            .map_err(|e| DigestError::io(&path, e))?;
        info!(path = %path.display(), count = records.len(), "Saved article to daily batch");
        Ok(records.len())
    }

    /// Typed view of a day's batch. Records that do not match the current
    /// schema are skipped.
    pub async fn load(&self, day: NaiveDate) -> Result<Vec<Article>> {
        let records = Self::load_records(&self.batch_path(day)).await?;
        Ok(records
            .into_iter()
            .filter_map(|r| serde_json::from_value(r).ok())
            .collect())
    }

    /// Remove leftover per-article JSON files from the old one-file-per-article
    /// layout. Daily batch files are kept. Returns the number of files removed.
    #[instrument(level = "info", skip_all, fields(dir = %self.dir.display(), %today))]
    pub async fn reconcile_legacy_files(&self, today: NaiveDate) -> Result<usize> {
        let today_file = Self::batch_file_name(today);
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(DigestError::io(&self.dir, e)),
        };

        let mut removed = 0;
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| DigestError::io(&self.dir, e))?
        {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file || !name.ends_with(".json") {
                continue;
            }
            if name == today_file || BATCH_FILE.is_match(&name) {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Could not remove legacy file"),
            }
        }
        if removed > 0 {
            info!(removed, "Removed legacy per-article files");
        }
        Ok(removed)
    }
}

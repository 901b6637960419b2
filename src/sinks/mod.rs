//! Result persistence: an append-only CSV, one JSON document per result and
//! a capped master log.

pub mod consolidate;
pub mod csv;
pub mod json;

use crate::config::OutputConfig;
use crate::error::SinkError;
use crate::results::ImprintResult;
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub use consolidate::{ConsolidationSummary, consolidate};

/// Writes every result to all sinks, one writer at a time
pub struct ResultStore {
    dir: PathBuf,
    config: OutputConfig,
    write_lock: Mutex<()>,
}

impl ResultStore {
    /// Open the store, creating the results directory if needed
    pub fn new(config: OutputConfig) -> Result<Self, SinkError> {
        let dir = PathBuf::from(&config.results_dir);
        std::fs::create_dir_all(&dir).map_err(|e| SinkError::io(&dir, e))?;

        Ok(Self {
            dir,
            config,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn csv_path(&self) -> PathBuf {
        self.dir.join(&self.config.csv_file)
    }

    pub fn master_log_path(&self) -> PathBuf {
        self.dir.join(&self.config.master_log_file)
    }

    /// Persist one result; returns the path of its JSON document
    pub async fn record(&self, result: &ImprintResult) -> Result<PathBuf, SinkError> {
        let _guard = self.write_lock.lock().await;
        let now = Local::now();

        self::csv::append_result(&self.csv_path(), result, now, &self.config)?;

        let document = self::json::document(result, now, self.config.max_field_length);
        let path = self::json::write_document(&self.dir, result, &document, now)?;
        self::json::append_to_master_log(
            &self.master_log_path(),
            document,
            self.config.master_log_limit,
        )?;

        ::log::debug!("Saved result for {} to {}", result.original_url, path.display());
        Ok(path)
    }
}

/// Replace `path` with `contents` via a temporary sibling, so readers never
/// see a half-written file
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), SinkError> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents).map_err(|e| SinkError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| SinkError::io(path, e))
}

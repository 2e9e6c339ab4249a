//! CSV materialization of collected sets.
//!
//! Each collected set is written as a single-column table with a header row.
//! Sets are unordered, so rows are sorted before writing to make one export
//! call deterministic. Existing files are overwritten without warning; write
//! failures propagate — data is never silently dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::model::AccountSet;

/// Column header used when the caller does not override it.
pub const DEFAULT_HEADER: &str = "Username";

/// Error type for CSV export.
#[derive(Debug)]
pub enum ExportError {
    /// Output directory could not be created, or the file could not be
    /// flushed.
    Io(io::Error),
    /// CSV writing failed.
    Csv(csv::Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(err) => write!(f, "export I/O error: {}", err),
            ExportError::Csv(err) => write!(f, "export CSV error: {}", err),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(err) => Some(err),
            ExportError::Csv(err) => Some(err),
        }
    }
}

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err)
    }
}

/// Writes named account sets under one output directory.
pub struct Exporter {
    out_dir: PathBuf,
}

impl Exporter {
    /// Creates an exporter rooted at `out_dir`. The directory itself is
    /// created lazily on the first export.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// The directory exports are written under.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Writes `data` to `<out_dir>/<file_stem>.csv` with a single `header`
    /// column, one identifier per row, rows sorted.
    pub fn export(
        &self,
        file_stem: &str,
        header: &str,
        data: &AccountSet,
    ) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(format!("{}.csv", file_stem));

        let mut rows: Vec<&str> = data.iter().map(String::as_str).collect();
        rows.sort_unstable();

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record([header])?;
        for row in rows {
            writer.write_record([row])?;
        }
        writer.flush()?;

        info!(file = %path.display(), rows = data.len(), "exported");
        Ok(path)
    }
}

//! Load-once access to the observation dataset.
//!
//! Every filter change re-runs the whole pipeline, but the input file only
//! needs to be read once per process. `CachedSource` wraps any
//! `ObservationSource` and hands out the same shared `Dataset` after the
//! first successful load.

use crate::data::loader;
use crate::error::Result;
use crate::models::Dataset;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Anything that can produce the daily observation dataset.
pub trait ObservationSource {
    fn load(&self) -> Result<Dataset>;

    /// Short description for log and error messages.
    fn describe(&self) -> String;
}

/// Reads observations from a workbook sheet or CSV file on disk.
#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    path: PathBuf,
    sheet: String,
}

impl SpreadsheetSource {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
        }
    }
}

impl ObservationSource for SpreadsheetSource {
    fn load(&self) -> Result<Dataset> {
        loader::load(&self.path, &self.sheet)
    }

    fn describe(&self) -> String {
        format!("{} [{}]", self.path.display(), self.sheet)
    }
}

/// Memoizes the first successful load of the wrapped source.
///
/// Failed loads are not cached, so a later call retries the inner source.
pub struct CachedSource<S> {
    inner: S,
    cell: OnceLock<Arc<Dataset>>,
}

impl<S: ObservationSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cell: OnceLock::new(),
        }
    }

    /// Returns the shared dataset, loading it on first use.
    pub fn get(&self) -> Result<Arc<Dataset>> {
        if let Some(dataset) = self.cell.get() {
            debug!("Using cached dataset from {}", self.inner.describe());
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(self.inner.load()?);
        // Another caller may have filled the cell in the meantime; keep theirs.
        Ok(Arc::clone(self.cell.get_or_init(|| dataset)))
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn describe(&self) -> String {
        self.inner.describe()
    }
}

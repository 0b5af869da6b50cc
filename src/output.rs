//! Result types returned by batch conversion and tool checks.

use crate::error::{FileError, Tex2ImgError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome for one source file of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    /// Full path of the source file.
    pub source: PathBuf,
    /// Produced image; `None` when the file failed.
    pub image: Option<PathBuf>,
    pub error: Option<FileError>,
    pub duration_ms: u64,
}

impl FileResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.image.is_some()
    }
}

/// Aggregate counters for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_files: usize,
    pub converted: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
}

/// Everything [`crate::convert::convert_dir`] did, in processing order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub files: Vec<FileResult>,
    pub stats: BatchStats,
}

impl BatchReport {
    /// Iterator over the per-file errors.
    pub fn errors(&self) -> impl Iterator<Item = &FileError> {
        self.files.iter().filter_map(|f| f.error.as_ref())
    }

    /// Images that were produced.
    pub fn images(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter().filter_map(|f| f.image.as_ref())
    }

    pub fn has_failures(&self) -> bool {
        self.stats.failed > 0
    }

    /// Serialise the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, Tex2ImgError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Tex2ImgError::Internal(format!("report serialisation: {e}")))
    }
}

/// Availability of one external program, from [`crate::convert::check_tools`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStatus {
    /// Role of the tool: `compiler` or `rasterizer`.
    pub role: String,
    pub program: String,
    pub available: bool,
    /// First line of the program's version banner.
    pub version: Option<String>,
    /// Why the program is unavailable.
    pub detail: Option<String>,
}

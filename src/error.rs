//! Error types for the tex2img library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Tex2ImgError`] — **Fatal** for the conversion that hit it: the
//!   compiler or rasterizer failed, an expected artifact never appeared, or
//!   the source could not be read. Returned as `Err(Tex2ImgError)` from
//!   [`crate::convert::tex_to_image`] and friends.
//!
//! * [`FileError`] — **Non-fatal** for a batch: one source file failed but
//!   the rest of the directory is still processed. Stored inside
//!   [`crate::output::FileResult`] so callers can inspect every failure after
//!   the run instead of losing the batch to the first bad file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the tex2img library.
///
/// Batch-level failures are recorded as [`FileError`] rather than propagated.
#[derive(Debug, Error)]
pub enum Tex2ImgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source file was not found at the given path.
    #[error("LaTeX source not found: '{path}'\nCheck the path exists and is readable.")]
    SourceNotFound { path: PathBuf },

    /// Reading or writing a file (or creating a directory) failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── External tool errors ──────────────────────────────────────────────
    /// The external program could not be started at all.
    #[error("Could not run '{tool}': {source}\nIs it installed and on PATH?")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program ran and exited with a non-zero status.
    #[error("{tool} failed{}:\n{diagnostics}", exit_suffix(.code))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        diagnostics: String,
    },

    /// A step reported success but its expected artifact is missing.
    #[error("{stage} file '{path}' was not created.")]
    FileNotCreated { path: PathBuf, stage: &'static str },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!(" with exit code {c}"),
        None => " (terminated by signal)".to_string(),
    }
}

impl Tex2ImgError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Tex2ImgError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable tag for the variant.
    pub fn kind(&self) -> FileErrorKind {
        match self {
            Tex2ImgError::SourceNotFound { .. } | Tex2ImgError::Io { .. } => FileErrorKind::Io,
            Tex2ImgError::ToolUnavailable { .. } | Tex2ImgError::ToolFailed { .. } => {
                FileErrorKind::ToolFailed
            }
            Tex2ImgError::FileNotCreated { .. } => FileErrorKind::FileNotCreated,
            Tex2ImgError::InvalidConfig(_) | Tex2ImgError::Internal(_) => FileErrorKind::Other,
        }
    }
}

/// Coarse classification of a per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorKind {
    /// Compiler or rasterizer exited non-zero or could not be started.
    ToolFailed,
    /// An expected artifact was absent after a step claimed success.
    FileNotCreated,
    /// Reading, writing or creating files failed.
    Io,
    Other,
}

/// A non-fatal error for a single source file in a batch.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{file}: {message}")]
pub struct FileError {
    /// File name of the source (not the full path).
    pub file: String,
    pub kind: FileErrorKind,
    /// Display text of the underlying [`Tex2ImgError`].
    pub message: String,
}

impl FileError {
    pub fn new(file: impl Into<String>, err: &Tex2ImgError) -> Self {
        Self {
            file: file.into(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failed_display_includes_code_and_diagnostics() {
        let e = Tex2ImgError::ToolFailed {
            tool: "pdflatex".into(),
            code: Some(1),
            diagnostics: "! Missing } inserted.".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("pdflatex failed with exit code 1"), "got: {msg}");
        assert!(msg.contains("Missing } inserted"), "got: {msg}");
    }

    #[test]
    fn tool_failed_display_without_code() {
        let e = Tex2ImgError::ToolFailed {
            tool: "magick".into(),
            code: None,
            diagnostics: String::new(),
        };
        assert!(e.to_string().contains("terminated by signal"));
    }

    #[test]
    fn file_not_created_display() {
        let e = Tex2ImgError::FileNotCreated {
            path: PathBuf::from("out/table.pdf"),
            stage: "PDF",
        };
        assert_eq!(e.to_string(), "PDF file 'out/table.pdf' was not created.");
    }

    #[test]
    fn file_error_carries_kind_and_message() {
        let e = Tex2ImgError::FileNotCreated {
            path: PathBuf::from("a.png"),
            stage: "Image",
        };
        let fe = FileError::new("a.tex", &e);
        assert_eq!(fe.kind, FileErrorKind::FileNotCreated);
        assert!(fe.to_string().starts_with("a.tex: Image file"));
    }

    #[test]
    fn tool_unavailable_is_tool_failure_kind() {
        let e = Tex2ImgError::ToolUnavailable {
            tool: "pdflatex".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(e.kind(), FileErrorKind::ToolFailed);
        assert!(e.to_string().contains("on PATH"));
    }
}

//! Document structure: turn a bare LaTeX fragment into a compilable document.
//!
//! Table exporters usually emit only a `table` environment. The check is a
//! plain substring test for `\begin{document}`; a file that has it is left
//! alone even if `\end{document}` is missing.

use crate::config::Preamble;
use crate::error::Tex2ImgError;
use std::path::Path;
use tracing::{debug, info};

pub const BEGIN_DOCUMENT: &str = "\\begin{document}";
pub const END_DOCUMENT: &str = "\\end{document}";

/// Wrap `content` in `preamble` and a closing `\end{document}`.
///
/// Returns `None` when `content` already contains `\begin{document}`.
pub fn wrap_document(content: &str, preamble: &Preamble) -> Option<String> {
    if content.contains(BEGIN_DOCUMENT) {
        return None;
    }
    let header = preamble.render();
    let mut doc = String::with_capacity(header.len() + content.len() + END_DOCUMENT.len() + 2);
    doc.push_str(&header);
    doc.push_str(content);
    doc.push('\n');
    doc.push_str(END_DOCUMENT);
    doc.push('\n');
    Some(doc)
}

/// Ensure the file at `path` is a complete document, rewriting it if needed.
///
/// Returns `true` when the preamble was injected.
pub fn ensure_document_structure(path: &Path, preamble: &Preamble) -> Result<bool, Tex2ImgError> {
    let content = std::fs::read_to_string(path).map_err(|e| Tex2ImgError::io(path, e))?;
    match wrap_document(&content, preamble) {
        Some(doc) => {
            info!("Adding document structure to {}", path.display());
            std::fs::write(path, doc).map_err(|e| Tex2ImgError::io(path, e))?;
            Ok(true)
        }
        None => {
            debug!("Document structure already exists in {}", path.display());
            Ok(false)
        }
    }
}

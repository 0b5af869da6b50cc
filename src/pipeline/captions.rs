//! Caption stripping: blank every source line that contains `\caption`.
//!
//! Table snippets exported by statistics packages carry a `\caption{…}` that
//! reads well in a paper but is redundant once the table is an image sitting
//! under its own heading. The match is line-granular and not brace-aware: a
//! caption whose argument spans several lines loses only its first line.
//!
//! Matched lines are replaced by an empty line rather than removed, so line
//! numbers in compiler diagnostics still point at the caller's source.

use crate::error::Tex2ImgError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

// Stops short of `\r` so CRLF sources keep their line endings.
static RE_CAPTION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[^\r\n]*\\caption[^\r\n]*").unwrap());

/// Blank every line containing `\caption`.
///
/// Returns the rewritten text and the number of lines blanked.
pub fn strip_captions(input: &str) -> (String, usize) {
    let count = RE_CAPTION_LINE.find_iter(input).count();
    if count == 0 {
        return (input.to_string(), 0);
    }
    (RE_CAPTION_LINE.replace_all(input, "").into_owned(), count)
}

/// Rewrite `path` in place with its caption lines blanked.
///
/// The file is only written back when at least one line matched.
pub fn remove_captions(path: &Path) -> Result<usize, Tex2ImgError> {
    let content = std::fs::read_to_string(path).map_err(|e| Tex2ImgError::io(path, e))?;
    let (stripped, count) = strip_captions(&content);
    if count > 0 {
        std::fs::write(path, stripped).map_err(|e| Tex2ImgError::io(path, e))?;
    }
    debug!("Removed {} caption line(s) from {}", count, path.display());
    Ok(count)
}

//! Removal of compiler build files once the image exists.

use crate::error::Tex2ImgError;
use crate::pipeline::compile::artifact_path;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions of the files pdflatex leaves next to the source.
pub const INTERMEDIATE_EXTENSIONS: [&str; 3] = ["pdf", "log", "aux"];

/// Delete the PDF, log and aux files produced for `source`.
///
/// Files that are already gone are skipped. Returns the paths actually removed.
pub fn remove_intermediates(source: &Path) -> Result<Vec<PathBuf>, Tex2ImgError> {
    let mut removed = Vec::new();
    for ext in INTERMEDIATE_EXTENSIONS {
        let path = artifact_path(source, ext);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed {}", path.display());
                removed.push(path);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Tex2ImgError::io(path, e)),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_present_and_skips_absent() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("table.tex");
        std::fs::write(&source, "x").unwrap();
        std::fs::write(dir.path().join("table.pdf"), b"%PDF").unwrap();
        std::fs::write(dir.path().join("table.log"), "log").unwrap();

        let removed = remove_intermediates(&source).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!dir.path().join("table.pdf").exists());
        assert!(!dir.path().join("table.log").exists());
        assert!(source.exists(), "source must survive cleanup");
    }

    #[test]
    fn test_nothing_to_remove() {
        let dir = tempfile::tempdir().unwrap();
        let removed = remove_intermediates(&dir.path().join("ghost.tex")).unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn test_other_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.tex");
        std::fs::write(dir.path().join("b.pdf"), b"%PDF").unwrap();
        std::fs::write(dir.path().join("a.out"), "").unwrap();

        remove_intermediates(&source).unwrap();
        assert!(dir.path().join("b.pdf").exists());
        assert!(dir.path().join("a.out").exists());
    }
}

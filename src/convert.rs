//! Conversion entry points.
//!
//! [`tex_to_image`] runs the whole pipeline for one source file,
//! [`convert_dir`] runs it for every matching file of a directory and keeps
//! going past failures, [`convert_source`] takes LaTeX text instead of a file,
//! and [`check_tools`] probes the two external programs without converting.

use crate::config::ConversionConfig;
use crate::error::{FileError, Tex2ImgError};
use crate::output::{BatchReport, BatchStats, FileResult, ToolStatus};
use crate::pipeline::{captions, cleanup, compile, rasterize, structure};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// Convert a LaTeX source file to an image.
///
/// The source is **modified in place**: caption lines are blanked and a
/// preamble is injected when the file is a bare fragment (each step can be
/// switched off in `config`).
///
/// # Arguments
/// * `source`       — path to the `.tex` file
/// * `output_image` — image to create; its extension selects the format
/// * `config`       — conversion configuration
///
/// # Returns
/// The output image path.
///
/// # Errors
/// The first failing step ends the conversion. Build files from a failed run
/// are left in place for inspection.
pub fn tex_to_image(
    source: impl AsRef<Path>,
    output_image: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<PathBuf, Tex2ImgError> {
    let source = source.as_ref();
    let output_image = output_image.as_ref();
    info!("Starting conversion: {}", source.display());

    if !source.is_file() {
        return Err(Tex2ImgError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }

    // ── Step 1: Strip captions ───────────────────────────────────────────
    if config.strip_captions {
        captions::remove_captions(source)?;
    }

    // ── Step 2: Ensure document structure ────────────────────────────────
    if config.ensure_structure {
        structure::ensure_document_structure(source, &config.preamble)?;
    }

    if let Some(parent) = output_image.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| Tex2ImgError::io(parent, e))?;
        }
    }

    let runner = config.tool_runner();

    // ── Step 3: Compile to PDF ───────────────────────────────────────────
    let pdf = compile::compile(runner.as_ref(), source, config)?;

    // ── Step 4: Rasterise ────────────────────────────────────────────────
    rasterize::rasterize(runner.as_ref(), &pdf, output_image, config)?;

    // ── Step 5: Clean up ─────────────────────────────────────────────────
    if config.keep_intermediates {
        debug!("Keeping build files for {}", source.display());
    } else {
        cleanup::remove_intermediates(source)?;
    }

    info!("Converted: {} to {}", source.display(), output_image.display());
    Ok(output_image.to_path_buf())
}

/// Convert LaTeX text to an image.
///
/// The text is written to a managed [`tempfile::TempDir`] that is removed on
/// return, so no build files are left behind even when compilation fails.
///
/// # Example
/// ```rust,no_run
/// use tex2img::{convert_source, ConversionConfig};
///
/// let table = r"\begin{tabular}{lc} a & 1 \\ \end{tabular}";
/// convert_source(table, "table.png", &ConversionConfig::default())?;
/// # Ok::<(), tex2img::Tex2ImgError>(())
/// ```
pub fn convert_source(
    source: &str,
    output_image: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<PathBuf, Tex2ImgError> {
    let tmp = tempfile::TempDir::new()
        .map_err(|e| Tex2ImgError::Internal(format!("tempdir: {e}")))?;
    let path = tmp.path().join(format!("document.{}", config.source_extension));
    std::fs::write(&path, source).map_err(|e| Tex2ImgError::io(&path, e))?;
    // `tmp` is dropped (and the directory deleted) when this returns
    tex_to_image(&path, output_image, config)
}

/// Convert every matching source file in `input_dir` into `output_dir`.
///
/// Files are matched by name suffix (`.<source_extension>`), processed in name
/// order, and each image is named after its source with the extension
/// replaced by `image_extension`. A failing file is logged and recorded in the
/// report; the batch always runs to the end.
///
/// # Errors
/// Only when the batch cannot start: `output_dir` cannot be created or
/// `input_dir` cannot be listed.
pub fn convert_dir(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<BatchReport, Tex2ImgError> {
    let batch_start = Instant::now();
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref();

    if !output_dir.exists() {
        std::fs::create_dir_all(output_dir).map_err(|e| Tex2ImgError::io(output_dir, e))?;
    }

    let sources = list_sources(input_dir, &config.source_extension)?;
    let total = sources.len();
    info!("Found {} source file(s) in {}", total, input_dir.display());

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut files = Vec::with_capacity(total);
    for (i, (name, source)) in sources.into_iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(index, total, &name);
        }

        let image_path =
            output_dir.join(Path::new(&name).with_extension(&config.image_extension));
        let start = Instant::now();
        let result = tex_to_image(&source, &image_path, config);
        let duration_ms = start.elapsed().as_millis() as u64;

        let file_result = match result {
            Ok(image) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_complete(index, total, &name, &image);
                }
                FileResult {
                    source,
                    image: Some(image),
                    error: None,
                    duration_ms,
                }
            }
            Err(e) => {
                error!("Error processing {}: {}", name, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_error(index, total, &name, &e.to_string());
                }
                FileResult {
                    source,
                    image: None,
                    error: Some(FileError::new(name, &e)),
                    duration_ms,
                }
            }
        };
        files.push(file_result);
    }

    let converted = files.iter().filter(|f| f.is_success()).count();
    let stats = BatchStats {
        total_files: total,
        converted,
        failed: total - converted,
        total_duration_ms: batch_start.elapsed().as_millis() as u64,
    };

    info!(
        "Batch complete: {}/{} files, {}ms total",
        converted, total, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, converted);
    }

    Ok(BatchReport { files, stats })
}

/// Probe the configured compiler and rasterizer.
///
/// Never fails: an unavailable program is reported with `available: false`.
pub fn check_tools(config: &ConversionConfig) -> Vec<ToolStatus> {
    let runner = config.tool_runner();
    [
        ("compiler", config.compiler.as_str(), "--version"),
        ("rasterizer", config.rasterizer.as_str(), "-version"),
    ]
    .into_iter()
    .map(|(role, program, flag)| {
        let args = [OsString::from(flag)];
        let (available, version, detail) = match runner.run(program, &args) {
            Ok(out) if out.success => {
                let version = out
                    .stdout
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .map(String::from);
                (true, version, None)
            }
            Ok(out) => (false, None, Some(crate::tools::diagnostics(&out))),
            Err(e) => (false, None, Some(e.to_string())),
        };
        debug!("{} '{}' available: {}", role, program, available);
        ToolStatus {
            role: role.to_string(),
            program: program.to_string(),
            available,
            version,
            detail,
        }
    })
    .collect()
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// `(file name, path)` of every regular file in `dir` ending in `.<ext>`, sorted by name.
fn list_sources(dir: &Path, ext: &str) -> Result<Vec<(String, PathBuf)>, Tex2ImgError> {
    let suffix = format!(".{ext}");
    let entries = std::fs::read_dir(dir).map_err(|e| Tex2ImgError::io(dir, e))?;

    let mut sources = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Tex2ImgError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if name.ends_with(&suffix) && path.is_file() {
            sources.push((name, path));
        }
    }
    sources.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_sources_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.tex", "a.tex", "notes.txt", "c.tex.bak", "z.TEX"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.tex")).unwrap();

        let names: Vec<String> = list_sources(dir.path(), "tex")
            .unwrap()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["a.tex", "b.tex"]);
    }

    #[test]
    fn test_list_sources_missing_dir() {
        let err = list_sources(Path::new("/definitely/not/a/dir"), "tex").unwrap_err();
        assert!(matches!(err, Tex2ImgError::Io { .. }));
    }

    #[test]
    fn test_missing_source_is_reported_before_anything_runs() {
        let dir = tempfile::tempdir().unwrap();
        let err = tex_to_image(
            dir.path().join("nope.tex"),
            dir.path().join("nope.png"),
            &ConversionConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Tex2ImgError::SourceNotFound { .. }));
        assert!(!dir.path().join("nope.png").exists());
    }
}

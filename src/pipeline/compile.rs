//! LaTeX compilation: source `.tex` → intermediate PDF.
//!
//! The compiler is pointed at the source's own directory with
//! `-output-directory`, so the PDF and its side files land next to the source
//! and are found again by swapping the extension.

use crate::config::ConversionConfig;
use crate::error::Tex2ImgError;
use crate::tools::{run_checked, ToolRunner};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory the compiler writes into: the source's parent, or `.` for a bare file name.
pub fn output_dir(source: &Path) -> PathBuf {
    match source.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `<output_dir>/<stem>.<ext>` — where the compiler puts a build file for `source`.
pub fn artifact_path(source: &Path, ext: &str) -> PathBuf {
    // Not `with_extension`: a stem like `model.v2` must keep its inner dot.
    let mut name = source
        .file_stem()
        .unwrap_or(source.as_os_str())
        .to_os_string();
    name.push(".");
    name.push(ext);
    output_dir(source).join(name)
}

/// Arguments passed to the compiler for `source`.
pub fn compiler_args(source: &Path, config: &ConversionConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-output-directory".into(),
        output_dir(source).into_os_string(),
    ];
    args.extend(config.compiler_args.iter().map(OsString::from));
    args.push(source.as_os_str().to_owned());
    args
}

/// Compile `source` and return the path of the produced PDF.
///
/// # Errors
/// * [`Tex2ImgError::ToolUnavailable`] — the compiler could not be started
/// * [`Tex2ImgError::ToolFailed`] — non-zero exit; carries LaTeX's error lines
/// * [`Tex2ImgError::FileNotCreated`] — exit 0 but no PDF (e.g. empty body)
pub fn compile(
    runner: &dyn ToolRunner,
    source: &Path,
    config: &ConversionConfig,
) -> Result<PathBuf, Tex2ImgError> {
    let args = compiler_args(source, config);
    info!("Compiling {} with {}", source.display(), config.compiler);

    let output = run_checked(runner, &config.compiler, &args).inspect_err(|e| {
        warn!("{} failed on {}: {}", config.compiler, source.display(), e);
    })?;
    debug!("{} output:\n{}", config.compiler, output.stdout);

    let pdf = artifact_path(source, "pdf");
    if !pdf.exists() {
        return Err(Tex2ImgError::FileNotCreated {
            path: pdf,
            stage: "PDF",
        });
    }
    Ok(pdf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolOutput;
    use std::sync::Mutex;

    #[test]
    fn test_output_dir_of_bare_name_is_cwd() {
        assert_eq!(output_dir(Path::new("table.tex")), PathBuf::from("."));
        assert_eq!(output_dir(Path::new("out/table.tex")), PathBuf::from("out"));
    }

    #[test]
    fn test_artifact_path_swaps_extension() {
        assert_eq!(
            artifact_path(Path::new("out/table.tex"), "pdf"),
            PathBuf::from("out/table.pdf")
        );
        assert_eq!(
            artifact_path(Path::new("out/model.v2.tex"), "log"),
            PathBuf::from("out/model.v2.log")
        );
    }

    #[test]
    fn test_compiler_args_layout() {
        let config = ConversionConfig::builder()
            .compiler_arg("-interaction=nonstopmode")
            .build()
            .unwrap();
        let args = compiler_args(Path::new("out/table.tex"), &config);
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-output-directory",
                "out",
                "-interaction=nonstopmode",
                "out/table.tex"
            ]
        );
    }

    /// Exits 0 without writing anything.
    struct SilentCompiler {
        calls: Mutex<Vec<String>>,
    }

    impl ToolRunner for SilentCompiler {
        fn run(&self, program: &str, _args: &[OsString]) -> Result<ToolOutput, Tex2ImgError> {
            self.calls.lock().unwrap().push(program.to_string());
            Ok(ToolOutput::ok("Output written on nothing"))
        }
    }

    #[test]
    fn test_missing_pdf_after_success_is_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("empty.tex");
        std::fs::write(&source, "").unwrap();

        let runner = SilentCompiler {
            calls: Mutex::new(Vec::new()),
        };
        let err = compile(&runner, &source, &ConversionConfig::default()).unwrap_err();
        match err {
            Tex2ImgError::FileNotCreated { path, stage } => {
                assert_eq!(stage, "PDF");
                assert_eq!(path, dir.path().join("empty.pdf"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(*runner.calls.lock().unwrap(), vec!["pdflatex".to_string()]);
    }
}

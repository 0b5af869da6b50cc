//! Rasterisation: intermediate PDF → output image via ImageMagick.
//!
//! The flag set is fixed apart from density and quality: white background,
//! alpha removed and switched off (a transparent PDF page would otherwise
//! render black in JPEG output), and `-trim` to crop the page down to the
//! table itself.

use crate::config::ConversionConfig;
use crate::error::Tex2ImgError;
use crate::tools::{run_checked, ToolRunner};
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, info, warn};

/// Arguments passed to the rasterizer.
pub fn rasterizer_args(
    pdf: &Path,
    output_image: &Path,
    config: &ConversionConfig,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(13);
    args.push("-density".into());
    args.push(config.density.to_string().into());
    args.push(pdf.as_os_str().to_owned());
    for flag in ["-background", "white", "-alpha", "remove", "-alpha", "off", "-trim"] {
        args.push(flag.into());
    }
    args.push("-quality".into());
    args.push(config.quality.to_string().into());
    args.push(output_image.as_os_str().to_owned());
    args
}

/// Render `pdf` to `output_image`.
///
/// # Errors
/// * [`Tex2ImgError::ToolUnavailable`] / [`Tex2ImgError::ToolFailed`] — as for compilation
/// * [`Tex2ImgError::FileNotCreated`] — exit 0 but the image is absent
pub fn rasterize(
    runner: &dyn ToolRunner,
    pdf: &Path,
    output_image: &Path,
    config: &ConversionConfig,
) -> Result<(), Tex2ImgError> {
    let args = rasterizer_args(pdf, output_image, config);
    info!(
        "Rasterising {} → {} ({} dpi, quality {})",
        pdf.display(),
        output_image.display(),
        config.density,
        config.quality
    );

    let output = run_checked(runner, &config.rasterizer, &args).inspect_err(|e| {
        warn!("{} failed on {}: {}", config.rasterizer, pdf.display(), e);
    })?;
    if !output.stdout.trim().is_empty() {
        debug!("{} output:\n{}", config.rasterizer, output.stdout);
    }

    if !output_image.exists() {
        return Err(Tex2ImgError::FileNotCreated {
            path: output_image.to_path_buf(),
            stage: "Image",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolOutput;

    #[test]
    fn test_rasterizer_args_layout() {
        let config = ConversionConfig::builder()
            .density(150)
            .quality(75)
            .build()
            .unwrap();
        let args: Vec<String> = rasterizer_args(Path::new("t.pdf"), Path::new("t.png"), &config)
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-density", "150", "t.pdf", "-background", "white", "-alpha", "remove",
                "-alpha", "off", "-trim", "-quality", "75", "t.png",
            ]
        );
    }

    struct FailingMagick;

    impl ToolRunner for FailingMagick {
        fn run(&self, _program: &str, _args: &[OsString]) -> Result<ToolOutput, Tex2ImgError> {
            Ok(ToolOutput::failed(
                1,
                "",
                "magick: attempt to perform an operation not allowed by the security policy `PDF'",
            ))
        }
    }

    #[test]
    fn test_failure_surfaces_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("t.png");
        let err = rasterize(
            &FailingMagick,
            &dir.path().join("t.pdf"),
            &out,
            &ConversionConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("security policy"), "got: {err}");
        assert!(!out.exists());
    }

    struct NoOpMagick;

    impl ToolRunner for NoOpMagick {
        fn run(&self, _program: &str, _args: &[OsString]) -> Result<ToolOutput, Tex2ImgError> {
            Ok(ToolOutput::ok(""))
        }
    }

    #[test]
    fn test_missing_image_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let err = rasterize(
            &NoOpMagick,
            &dir.path().join("t.pdf"),
            &dir.path().join("t.png"),
            &ConversionConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Tex2ImgError::FileNotCreated { stage: "Image", .. }
        ));
    }
}

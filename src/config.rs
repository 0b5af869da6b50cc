//! Configuration types for LaTeX-to-image conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The same config is used for a single
//! [`crate::convert::tex_to_image`] call and for every file of a
//! [`crate::convert::convert_dir`] batch.

use crate::error::Tex2ImgError;
use crate::progress::ProgressCallback;
use crate::tools::{SystemRunner, ToolRunner};
use std::fmt;
use std::sync::Arc;

/// Configuration for a LaTeX-to-image conversion.
///
/// # Example
/// ```rust
/// use tex2img::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .density(150)
///     .quality(85)
///     .build()
///     .unwrap();
/// assert_eq!(config.density, 150);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rasterizer pixel density (`-density`). Default: 300.
    pub density: u32,

    /// Rasterizer compression quality (`-quality`), 1–100. Default: 90.
    pub quality: u32,

    /// LaTeX compiler program. Default: `pdflatex`.
    pub compiler: String,

    /// Extra compiler arguments, inserted between `-output-directory <dir>`
    /// and the source path. Default: none.
    pub compiler_args: Vec<String>,

    /// Rasterizer program. Default: `magick`.
    pub rasterizer: String,

    /// Blank every line containing `\caption` before compiling. Default: true.
    pub strip_captions: bool,

    /// Wrap fragments lacking `\begin{document}` in [`Self::preamble`]. Default: true.
    pub ensure_structure: bool,

    /// Preamble injected by the structure step.
    pub preamble: Preamble,

    /// Leave the PDF, log and aux files next to the source. Default: false.
    pub keep_intermediates: bool,

    /// Extension (without dot) a file must end with to be picked up in batch mode. Default: `tex`.
    pub source_extension: String,

    /// Extension (without dot) of images produced in batch mode. Default: `png`.
    pub image_extension: String,

    /// Pre-constructed tool runner. Falls back to [`SystemRunner`] when `None`.
    pub runner: Option<Arc<dyn ToolRunner>>,

    /// Optional batch progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            density: 300,
            quality: 90,
            compiler: "pdflatex".to_string(),
            compiler_args: Vec::new(),
            rasterizer: "magick".to_string(),
            strip_captions: true,
            ensure_structure: true,
            preamble: Preamble::default(),
            keep_intermediates: false,
            source_extension: "tex".to_string(),
            image_extension: "png".to_string(),
            runner: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("density", &self.density)
            .field("quality", &self.quality)
            .field("compiler", &self.compiler)
            .field("compiler_args", &self.compiler_args)
            .field("rasterizer", &self.rasterizer)
            .field("strip_captions", &self.strip_captions)
            .field("ensure_structure", &self.ensure_structure)
            .field("preamble", &self.preamble)
            .field("keep_intermediates", &self.keep_intermediates)
            .field("source_extension", &self.source_extension)
            .field("image_extension", &self.image_extension)
            .field("runner", &self.runner.as_ref().map(|_| "<dyn ToolRunner>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The configured runner, or the process-spawning default.
    pub(crate) fn tool_runner(&self) -> Arc<dyn ToolRunner> {
        match self.runner {
            Some(ref runner) => Arc::clone(runner),
            None => Arc::new(SystemRunner),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn density(mut self, density: u32) -> Self {
        self.config.density = density.max(1);
        self
    }

    pub fn quality(mut self, quality: u32) -> Self {
        self.config.quality = quality.clamp(1, 100);
        self
    }

    pub fn compiler(mut self, program: impl Into<String>) -> Self {
        self.config.compiler = program.into();
        self
    }

    pub fn compiler_arg(mut self, arg: impl Into<String>) -> Self {
        self.config.compiler_args.push(arg.into());
        self
    }

    pub fn rasterizer(mut self, program: impl Into<String>) -> Self {
        self.config.rasterizer = program.into();
        self
    }

    pub fn strip_captions(mut self, v: bool) -> Self {
        self.config.strip_captions = v;
        self
    }

    pub fn ensure_structure(mut self, v: bool) -> Self {
        self.config.ensure_structure = v;
        self
    }

    pub fn preamble(mut self, preamble: Preamble) -> Self {
        self.config.preamble = preamble;
        self
    }

    pub fn keep_intermediates(mut self, v: bool) -> Self {
        self.config.keep_intermediates = v;
        self
    }

    /// Leading dots are ignored: `".tex"` and `"tex"` are equivalent.
    pub fn source_extension(mut self, ext: impl AsRef<str>) -> Self {
        self.config.source_extension = ext.as_ref().trim_start_matches('.').to_string();
        self
    }

    /// Leading dots are ignored: `".png"` and `"png"` are equivalent.
    pub fn image_extension(mut self, ext: impl AsRef<str>) -> Self {
        self.config.image_extension = ext.as_ref().trim_start_matches('.').to_string();
        self
    }

    pub fn runner(mut self, runner: Arc<dyn ToolRunner>) -> Self {
        self.config.runner = Some(runner);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Tex2ImgError> {
        let c = &self.config;
        if c.compiler.trim().is_empty() {
            return Err(Tex2ImgError::InvalidConfig("Compiler program must not be empty".into()));
        }
        if c.rasterizer.trim().is_empty() {
            return Err(Tex2ImgError::InvalidConfig("Rasterizer program must not be empty".into()));
        }
        if c.source_extension.is_empty() || c.image_extension.is_empty() {
            return Err(Tex2ImgError::InvalidConfig(
                "Source and image extensions must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Preamble ─────────────────────────────────────────────────────────────

/// Document header injected in front of bare LaTeX fragments.
///
/// The default renders to:
///
/// ```text
/// \documentclass{article}
/// \usepackage{dcolumn}
/// \usepackage{float}
/// \usepackage{booktabs}
/// \usepackage{graphicx}
/// \pagestyle{empty}
/// \begin{document}
/// ```
///
/// `dcolumn` and `booktabs` cover the table output of common regression-table
/// generators; `\pagestyle{empty}` keeps the page number out of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    pub document_class: String,
    pub packages: Vec<String>,
    /// Argument to `\pagestyle`. `None` omits the command.
    pub page_style: Option<String>,
}

impl Default for Preamble {
    fn default() -> Self {
        Self {
            document_class: "article".to_string(),
            packages: ["dcolumn", "float", "booktabs", "graphicx"]
                .into_iter()
                .map(String::from)
                .collect(),
            page_style: Some("empty".to_string()),
        }
    }
}

impl Preamble {
    /// Append a package unless it is already listed.
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        let package = package.into();
        if !self.packages.contains(&package) {
            self.packages.push(package);
        }
        self
    }

    /// Render the header, ending with `\begin{document}` and a newline.
    pub fn render(&self) -> String {
        let mut s = format!("\\documentclass{{{}}}\n", self.document_class);
        for p in &self.packages {
            s.push_str(&format!("\\usepackage{{{}}}\n", p));
        }
        if let Some(ref style) = self.page_style {
            s.push_str(&format!("\\pagestyle{{{}}}\n", style));
        }
        s.push_str("\\begin{document}\n");
        s
    }
}

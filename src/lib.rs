//! # tex2img
//!
//! Render LaTeX snippets (regression tables, report fragments) to raster
//! images by driving `pdflatex` and ImageMagick.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .tex
//!  │
//!  ├─ 1. Captions   blank every line containing \caption   (in place)
//!  ├─ 2. Structure  wrap bare fragments in a preamble       (in place)
//!  ├─ 3. Compile    pdflatex -output-directory <dir> <src>  → <stem>.pdf
//!  ├─ 4. Rasterise  magick -density D … -trim -quality Q    → image
//!  └─ 5. Cleanup    remove <stem>.pdf / .log / .aux
//! ```
//!
//! Everything is synchronous: each tool runs to completion before the next
//! step starts, and a batch processes one file at a time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tex2img::{convert_dir, tex_to_image, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default(); // 300 dpi, quality 90
//!
//!     tex_to_image("tables/model_summary.tex", "images/model_summary.png", &config)?;
//!
//!     let report = convert_dir("tables", "images", &config)?;
//!     for err in report.errors() {
//!         eprintln!("{err}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Testing without a TeX install
//!
//! Subprocesses go through the [`ToolRunner`] trait. Inject a fake with
//! [`ConversionConfigBuilder::runner`] to exercise the pipeline in unit tests.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `tex2img` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod tools;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, Preamble};
pub use convert::{check_tools, convert_dir, convert_source, tex_to_image};
pub use error::{FileError, FileErrorKind, Tex2ImgError};
pub use output::{BatchReport, BatchStats, FileResult, ToolStatus};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use tools::{SystemRunner, ToolOutput, ToolRunner};

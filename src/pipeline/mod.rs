//! Pipeline stages for LaTeX-to-image conversion.
//!
//! Each submodule implements exactly one step, so each is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! captions ──▶ structure ──▶ compile ──▶ rasterize ──▶ cleanup
//! (\caption)   (preamble)    (pdflatex)  (magick)      (.pdf .log .aux)
//! ```
//!
//! 1. [`captions`]  — blank lines containing `\caption`, in place
//! 2. [`structure`] — wrap fragments lacking `\begin{document}`, in place
//! 3. [`compile`]   — run the compiler into the source's directory, check the PDF
//! 4. [`rasterize`] — run the rasterizer on the PDF, check the image
//! 5. [`cleanup`]   — delete the PDF and the compiler's side files

pub mod captions;
pub mod cleanup;
pub mod compile;
pub mod rasterize;
pub mod structure;

//! CLI binary for tex2img.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tex2img::{
    check_tools, convert_dir, tex_to_image, BatchReport, ConversionConfig,
    ConversionProgressCallback, ProgressCallback,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback for batch mode: a progress bar plus one log
/// line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Wall-clock start of the file currently in the pipeline.
    file_start: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` tells us how many files there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Looking for sources…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            file_start: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
    }

    fn elapsed_secs(&self) -> f64 {
        self.file_start
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.activate_bar(total_files);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rendering {total_files} LaTeX files…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, name: &str) {
        if let Ok(mut s) = self.file_start.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, name: &str, image: &Path) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  →  {}  {}",
            green("✓"),
            index,
            total,
            name,
            dim(&image.display().to_string()),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let secs = self.elapsed_secs();
        self.errors.fetch_add(1, Ordering::SeqCst);

        // First line only; the full diagnostics are in the report / logs.
        let first = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index,
            total,
            name,
            red(first),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&converted.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&converted.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Single file → tables/model_summary.png
  tex2img tables/model_summary.tex

  # Single file, explicit output and resolution
  tex2img --density 600 tables/model_summary.tex -o figures/summary.png

  # Every .tex in a directory → images/*.png
  tex2img tables/ -o images/

  # JPEG output, keep the captions
  tex2img --format jpg --quality 85 --keep-captions tables/ -o images/

  # Verify pdflatex and ImageMagick are installed
  tex2img --check-tools

  # Machine-readable batch report
  tex2img --json tables/ -o images/ > report.json

NOTES:
  The source files are edited in place: caption lines are blanked and bare
  fragments get a preamble (\documentclass{article} with dcolumn, float,
  booktabs, graphicx and \pagestyle{empty}). Use --keep-captions / --no-wrap
  to disable either step.

  On ImageMagick 6 the rasterizer is called `convert`: pass --rasterizer convert.

ENVIRONMENT VARIABLES:
  TEX2IMG_*   every flag has an env equivalent, e.g. TEX2IMG_DENSITY=600
  RUST_LOG    overrides the log filter, e.g. RUST_LOG=tex2img=debug
"#;

/// Render LaTeX snippets to images with pdflatex and ImageMagick.
#[derive(Parser, Debug)]
#[command(
    name = "tex2img",
    version,
    about = "Render LaTeX snippets to images with pdflatex and ImageMagick",
    long_about = "Render LaTeX table and report snippets to PNG (or any ImageMagick format). \
Accepts a single .tex file or a directory; in directory mode a failing file is reported and \
the rest of the batch continues.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// A .tex file or a directory of .tex files.
    #[arg(required_unless_present = "check_tools")]
    input: Option<PathBuf>,

    /// Output image (file input) or output directory (directory input).
    #[arg(short, long, env = "TEX2IMG_OUTPUT")]
    output: Option<PathBuf>,

    /// Rasterizer pixel density.
    #[arg(long, env = "TEX2IMG_DENSITY", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(1..))]
    density: u32,

    /// Image compression quality (1–100).
    #[arg(long, env = "TEX2IMG_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: u32,

    /// LaTeX compiler program.
    #[arg(long, env = "TEX2IMG_COMPILER", default_value = "pdflatex")]
    compiler: String,

    /// Extra argument for the compiler (repeatable), e.g. -interaction=nonstopmode.
    #[arg(long = "compiler-arg", env = "TEX2IMG_COMPILER_ARGS", value_delimiter = ',',
          allow_hyphen_values = true)]
    compiler_args: Vec<String>,

    /// Rasterizer program.
    #[arg(long, env = "TEX2IMG_RASTERIZER", default_value = "magick")]
    rasterizer: String,

    /// Image extension for directory mode and the default output name.
    #[arg(long, env = "TEX2IMG_FORMAT", default_value = "png")]
    format: String,

    /// Source extension matched in directory mode.
    #[arg(long, env = "TEX2IMG_SOURCE_EXT", default_value = "tex")]
    source_ext: String,

    /// Do not blank lines containing \caption.
    #[arg(long, env = "TEX2IMG_KEEP_CAPTIONS")]
    keep_captions: bool,

    /// Do not wrap fragments lacking \begin{document} in a preamble.
    #[arg(long, env = "TEX2IMG_NO_WRAP")]
    no_wrap: bool,

    /// Extra \usepackage for injected preambles (repeatable).
    #[arg(long = "package", env = "TEX2IMG_PACKAGES", value_delimiter = ',')]
    packages: Vec<String>,

    /// Keep the .pdf, .log and .aux files after a successful conversion.
    #[arg(long, env = "TEX2IMG_KEEP_INTERMEDIATES")]
    keep_intermediates: bool,

    /// Check that the compiler and rasterizer can be run, then exit.
    #[arg(long)]
    check_tools: bool,

    /// Print results as JSON on stdout.
    #[arg(long, env = "TEX2IMG_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "TEX2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs (includes full tool output).
    #[arg(short, long, env = "TEX2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TEX2IMG_QUIET")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let batch_mode = cli.input.as_deref().is_some_and(Path::is_dir);

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level logs in batch mode.
    let show_progress = batch_mode && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress || cli.json {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Tool check mode ──────────────────────────────────────────────────
    if cli.check_tools {
        let config = build_config(&cli, None)?;
        return run_check_tools(&cli, &config);
    }

    let input = cli
        .input
        .clone()
        .context("An input file or directory is required")?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    if batch_mode {
        run_batch(&cli, &input, &config)
    } else {
        run_single(&cli, &input, &config)
    }
}

/// Convert one file.
fn run_single(cli: &Cli, input: &Path, config: &ConversionConfig) -> Result<()> {
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| input.with_extension(&config.image_extension));

    let start = Instant::now();
    let image = tex_to_image(input, &output, config)
        .with_context(|| format!("Conversion of {} failed", input.display()))?;

    if cli.json {
        let value = serde_json::json!({
            "source": input,
            "image": image,
            "duration_ms": start.elapsed().as_millis() as u64,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {}  →  {}  {}",
            green("✔"),
            input.display(),
            bold(&image.display().to_string()),
            dim(&format!("{}ms", start.elapsed().as_millis())),
        );
    }
    Ok(())
}

/// Convert a directory; fails (exit 1) if any file failed.
fn run_batch(cli: &Cli, input: &Path, config: &ConversionConfig) -> Result<()> {
    let output_dir = cli.output.clone().unwrap_or_else(|| input.to_path_buf());

    let report = convert_dir(input, &output_dir, config)
        .with_context(|| format!("Could not process directory {}", input.display()))?;

    if cli.json {
        println!("{}", report.to_json().context("Failed to serialise report")?);
    } else if !cli.quiet && cli.no_progress {
        print_batch_summary(&report);
    }

    if report.has_failures() {
        anyhow::bail!(
            "{}/{} files failed",
            report.stats.failed,
            report.stats.total_files
        );
    }
    Ok(())
}

/// Plain-text summary used when the progress bar is off.
fn print_batch_summary(report: &BatchReport) {
    for file in &report.files {
        match (&file.image, &file.error) {
            (Some(image), _) => eprintln!(
                "Converted: {} to {}",
                file.source.display(),
                image.display()
            ),
            (None, Some(err)) => eprintln!("Error processing {err}"),
            (None, None) => {}
        }
    }
    eprintln!(
        "Converted {}/{} files in {}ms",
        report.stats.converted, report.stats.total_files, report.stats.total_duration_ms
    );
}

fn run_check_tools(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    let statuses = check_tools(config);

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&statuses).context("Failed to serialise tool status")?
        );
    } else {
        for s in &statuses {
            if s.available {
                println!(
                    "{} {:<10}  {:<10}  {}",
                    green("✓"),
                    s.role,
                    s.program,
                    dim(s.version.as_deref().unwrap_or(""))
                );
            } else {
                println!(
                    "{} {:<10}  {:<10}  {}",
                    red("✗"),
                    s.role,
                    s.program,
                    red(s.detail.as_deref().unwrap_or("unavailable"))
                );
            }
        }
    }

    if statuses.iter().any(|s| !s.available) {
        anyhow::bail!("Required tools are missing");
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut preamble = tex2img::Preamble::default();
    for p in &cli.packages {
        preamble = preamble.with_package(p.trim());
    }

    let mut builder = ConversionConfig::builder()
        .density(cli.density)
        .quality(cli.quality)
        .compiler(&cli.compiler)
        .rasterizer(&cli.rasterizer)
        .image_extension(&cli.format)
        .source_extension(&cli.source_ext)
        .strip_captions(!cli.keep_captions)
        .ensure_structure(!cli.no_wrap)
        .preamble(preamble)
        .keep_intermediates(cli.keep_intermediates);

    for arg in &cli.compiler_args {
        builder = builder.compiler_arg(arg);
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

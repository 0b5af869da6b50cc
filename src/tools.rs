//! External tool invocation.
//!
//! Every subprocess the pipeline starts goes through the [`ToolRunner`]
//! trait. The default [`SystemRunner`] shells out with
//! [`std::process::Command`]; tests inject a fake through
//! [`crate::config::ConversionConfigBuilder::runner`] so the pipeline can be
//! exercised without a TeX distribution or ImageMagick installed.

use crate::error::Tex2ImgError;
use std::ffi::OsString;
use std::process::{Command, Stdio};
use tracing::debug;

/// Number of trailing stdout lines kept when a tool printed nothing better.
const STDOUT_TAIL_LINES: usize = 20;

/// Captured result of one external tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Exit code, or `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Successful run with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed run with the given exit code and output streams.
    pub fn failed(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// Runs an external program to completion and captures its output.
///
/// Implementations must block until the process exits. A non-zero exit is
/// **not** an error at this level: it is reported through
/// [`ToolOutput::success`] so the caller can attach diagnostics. `Err` is
/// reserved for "the program could not be started".
pub trait ToolRunner: Send + Sync {
    fn run(&self, program: &str, args: &[OsString]) -> Result<ToolOutput, Tex2ImgError>;
}

/// [`ToolRunner`] backed by [`std::process::Command`].
///
/// Stdin is closed so a compiler that stops at an error prompt reads EOF and
/// exits instead of waiting on the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<ToolOutput, Tex2ImgError> {
        debug!("exec: {} {}", program, display_args(args));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Tex2ImgError::ToolUnavailable {
                tool: program.to_string(),
                source: e,
            })?;

        Ok(ToolOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run `program` and turn a non-zero exit into [`Tex2ImgError::ToolFailed`].
pub(crate) fn run_checked(
    runner: &dyn ToolRunner,
    program: &str,
    args: &[OsString],
) -> Result<ToolOutput, Tex2ImgError> {
    let output = runner.run(program, args)?;
    if !output.success {
        return Err(Tex2ImgError::ToolFailed {
            tool: program.to_string(),
            code: output.code,
            diagnostics: diagnostics(&output),
        });
    }
    Ok(output)
}

/// Extract the most useful failure text from a tool's output.
///
/// LaTeX reports errors on stdout as lines starting with `!`, followed by an
/// `l.<n>` context line. Those are preferred; otherwise stderr (where
/// ImageMagick writes), otherwise the tail of stdout.
pub fn diagnostics(output: &ToolOutput) -> String {
    let latex = latex_errors(&output.stdout);
    if !latex.is_empty() {
        return latex.join("\n");
    }

    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }

    let lines: Vec<&str> = output.stdout.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDOUT_TAIL_LINES);
    let tail = lines[start..].join("\n");
    if tail.is_empty() {
        "(no output captured)".to_string()
    } else {
        tail
    }
}

/// `!`-prefixed LaTeX error lines, each followed by its `l.<n>` line if one
/// appears before the next error.
fn latex_errors(stdout: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut lines = stdout.lines().peekable();
    while let Some(line) = lines.next() {
        if !line.starts_with('!') {
            continue;
        }
        out.push(line.trim_end());
        while let Some(next) = lines.peek() {
            if next.starts_with('!') {
                break;
            }
            let next = lines.next().unwrap_or_default();
            if next.starts_with("l.") {
                out.push(next.trim_end());
                break;
            }
        }
    }
    out
}

pub(crate) fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDFLATEX_FAILURE: &str = "\
This is pdfTeX, Version 3.141592653-2.6-1.40.25 (TeX Live 2023)
(./broken.tex
LaTeX2e <2022-11-01>
! Missing } inserted.
<inserted text>
                }
l.12 \\end{tabular}

?
! Emergency stop.
<inserted text>
                }
l.12 \\end{tabular}

No pages of output.
";

    #[test]
    fn diagnostics_prefers_latex_error_lines() {
        let out = ToolOutput::failed(1, PDFLATEX_FAILURE, "");
        let d = diagnostics(&out);
        assert_eq!(
            d,
            "! Missing } inserted.\nl.12 \\end{tabular}\n! Emergency stop.\nl.12 \\end{tabular}"
        );
    }

    #[test]
    fn diagnostics_falls_back_to_stderr() {
        let out = ToolOutput::failed(
            1,
            "",
            "magick: no images defined `out.png' @ error/convert.c/ConvertImageCommand/3362.\n",
        );
        assert!(diagnostics(&out).starts_with("magick: no images defined"));
    }

    #[test]
    fn diagnostics_uses_stdout_tail() {
        let stdout: String = (1..=30).map(|i| format!("line {i}\n")).collect();
        let out = ToolOutput::failed(2, stdout, "");
        let d = diagnostics(&out);
        assert!(d.starts_with("line 11"), "got: {d}");
        assert!(d.ends_with("line 30"));
    }

    #[test]
    fn diagnostics_with_no_output() {
        let out = ToolOutput::failed(1, "", "   ");
        assert_eq!(diagnostics(&out), "(no output captured)");
    }

    #[test]
    fn system_runner_reports_missing_program() {
        let err = SystemRunner
            .run("tex2img-definitely-not-a-real-program", &[])
            .unwrap_err();
        assert!(matches!(err, Tex2ImgError::ToolUnavailable { .. }));
    }

    struct Scripted(ToolOutput);

    impl ToolRunner for Scripted {
        fn run(&self, _program: &str, _args: &[OsString]) -> Result<ToolOutput, Tex2ImgError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn run_checked_maps_non_zero_exit() {
        let runner = Scripted(ToolOutput::failed(3, "", "boom"));
        let err = run_checked(&runner, "magick", &[]).unwrap_err();
        match err {
            Tex2ImgError::ToolFailed {
                tool,
                code,
                diagnostics,
            } => {
                assert_eq!(tool, "magick");
                assert_eq!(code, Some(3));
                assert_eq!(diagnostics, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn run_checked_passes_success_through() {
        let runner = Scripted(ToolOutput::ok("done"));
        let out = run_checked(&runner, "pdflatex", &[]).unwrap();
        assert_eq!(out.stdout, "done");
    }
}

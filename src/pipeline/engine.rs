//! The document-conversion engine capability.
//!
//! The gateway treats the engine as a black box behind [`Engine`]: given an
//! [`EngineInvocation`] it runs once and reports what it printed and how it
//! exited in an [`EngineReport`]. Judging that report (success or failure)
//! is the executor's job, not the engine's.
//!
//! [`PandocEngine`] runs the pandoc executable through `tokio::process`
//! without a shell. The child is killed if the timeout elapses or the
//! request future is dropped.

use crate::options::OutputFormat;
use crate::pipeline::args::ArgumentSet;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Everything the engine needs for one run. Built once by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    pub input_path: PathBuf,
    pub output_format: OutputFormat,
    pub output_path: PathBuf,
    pub arguments: ArgumentSet,
}

/// What the engine printed and how it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineReport {
    /// Standard output. Empty on success when writing to a file.
    pub diagnostics: String,
    /// Standard error. Warnings end up here even on success.
    pub warnings: String,
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
    pub success: bool,
}

/// Capability: convert `input_path` into `output_path`.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Short identifier for logs and the health endpoint.
    fn name(&self) -> &str;

    /// Whether the engine can be run at all.
    async fn is_available(&self) -> bool;

    /// Run once. `Err` means the engine could not be run or timed out.
    async fn convert(&self, invocation: &EngineInvocation) -> std::io::Result<EngineReport>;
}

/// Engine backed by the `pandoc` executable.
#[derive(Debug, Clone)]
pub struct PandocEngine {
    program: PathBuf,
    timeout: Duration,
    builtin_citeproc: bool,
}

impl PandocEngine {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration, builtin_citeproc: bool) -> Self {
        Self {
            program: program.into(),
            timeout,
            builtin_citeproc,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Full argv after the program name.
    pub fn command_args(&self, invocation: &EngineInvocation) -> Vec<String> {
        let mut argv = vec![
            invocation.input_path.display().to_string(),
            "--from".to_string(),
            "markdown".to_string(),
            "--to".to_string(),
            invocation.output_format.pandoc_writer().to_string(),
            "--output".to_string(),
            invocation.output_path.display().to_string(),
        ];
        argv.extend(invocation.arguments.to_argv(self.builtin_citeproc));
        argv
    }
}

#[async_trait]
impl Engine for PandocEngine {
    fn name(&self) -> &str {
        "pandoc"
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn convert(&self, invocation: &EngineInvocation) -> std::io::Result<EngineReport> {
        let argv = self.command_args(invocation);
        debug!("Running {} with {} args", self.program.display(), argv.len());

        let child = Command::new(&self.program)
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("pandoc timed out after {}s", self.timeout.as_secs()),
                )
            })??;

        Ok(EngineReport {
            diagnostics: String::from_utf8_lossy(&output.stdout).into_owned(),
            warnings: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            success: output.status.success(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ConversionOptions;
    use crate::pipeline::args::build_arguments;

    fn invocation(format: OutputFormat) -> EngineInvocation {
        let opts = ConversionOptions::builder()
            .output_format(format)
            .standalone(true)
            .citeproc(true)
            .build();
        EngineInvocation {
            input_path: PathBuf::from("/tmp/in.md"),
            output_format: format,
            output_path: PathBuf::from(format!("/tmp/out.{}", format.extension())),
            arguments: build_arguments(&opts, Some(Path::new("/tmp/refs.bib"))),
        }
    }

    #[test]
    fn command_line_layout() {
        let engine = PandocEngine::new("pandoc", Duration::from_secs(5), true);
        assert_eq!(
            engine.command_args(&invocation(OutputFormat::Html)),
            vec![
                "/tmp/in.md",
                "--from",
                "markdown",
                "--to",
                "html",
                "--output",
                "/tmp/out.html",
                "--standalone",
                "--citeproc",
                "--bibliography=/tmp/refs.bib",
            ]
        );
    }

    #[test]
    fn pdf_goes_through_latex_writer() {
        let engine = PandocEngine::new("pandoc", Duration::from_secs(5), false);
        let argv = engine.command_args(&invocation(OutputFormat::Pdf));
        assert_eq!(argv[4], "latex");
        assert_eq!(argv[6], "/tmp/out.pdf");
        assert!(argv.contains(&"pandoc-citeproc".to_string()));
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let engine = PandocEngine::new(
            "/definitely/not/pandoc",
            Duration::from_secs(5),
            true,
        );
        assert!(!engine.is_available().await);
        let err = engine
            .convert(&invocation(OutputFormat::Html))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}

//! Conversion execution: stage, invoke, judge.
//!
//! One call to [`ConversionExecutor::execute`] is exactly one engine run.
//! No retries: a document that fails once fails the same way again.
//!
//! ## Success criteria
//!
//! A run succeeds only when all of these hold:
//! 1. the engine could be started and finished before its timeout,
//! 2. it exited with status 0,
//! 3. it printed nothing on stdout (pandoc writes to `--output` instead),
//! 4. the output file is non-empty.
//!
//! Anything else becomes [`GatewayError::ConversionFailed`]. stderr on a
//! successful run is only logged, because pandoc emits warnings there for
//! documents it converts fine.
//!
//! The staged input is always released before returning. The output
//! artifact is released on failure and handed to the caller on success.

use crate::error::GatewayError;
use crate::options::OutputFormat;
use crate::pipeline::args::ArgumentSet;
use crate::pipeline::artifact::TempArtifact;
use crate::pipeline::engine::{Engine, EngineInvocation, EngineReport};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Longest engine message carried into an error response.
const MAX_DETAIL_CHARS: usize = 2000;

/// Runs the engine for one request.
pub struct ConversionExecutor {
    engine: Arc<dyn Engine>,
    scratch_dir: Option<PathBuf>,
}

impl ConversionExecutor {
    pub fn new(engine: Arc<dyn Engine>, scratch_dir: Option<PathBuf>) -> Self {
        Self {
            engine,
            scratch_dir,
        }
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    /// Convert `input` to `format` using `arguments`.
    ///
    /// # Returns
    /// The output artifact. The caller owns it and must release it once the
    /// bytes have been sent.
    pub async fn execute(
        &self,
        input: &[u8],
        format: OutputFormat,
        arguments: ArgumentSet,
    ) -> Result<TempArtifact, GatewayError> {
        let dir = self.scratch_dir.as_deref();
        let staged_input = TempArtifact::with_contents(".md", dir, input)?;
        let output = TempArtifact::create(&format!(".{}", format.extension()), dir)?;

        let invocation = EngineInvocation {
            input_path: staged_input.to_path_buf(),
            output_format: format,
            output_path: output.to_path_buf(),
            arguments,
        };
        debug!(
            "Engine invocation: {} {} --to {} -o {} {}",
            self.engine.name(),
            invocation.input_path.display(),
            format.pandoc_writer(),
            invocation.output_path.display(),
            invocation.arguments
        );

        let start = Instant::now();
        let report = self.engine.convert(&invocation).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        staged_input.release();

        match judge(report).and_then(|()| non_empty(&output)) {
            Ok(bytes) => {
                info!(
                    "{} produced {} bytes of {} in {}ms",
                    self.engine.name(),
                    bytes,
                    format,
                    elapsed_ms
                );
                Ok(output)
            }
            Err(e) => {
                output.release();
                Err(e)
            }
        }
    }
}

/// Map the raw engine outcome to success or `ConversionFailed`.
fn judge(report: std::io::Result<EngineReport>) -> Result<(), GatewayError> {
    let report = report.map_err(|e| GatewayError::ConversionFailed {
        detail: format!("could not run engine: {e}"),
    })?;

    if !report.success {
        let code = report
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        return Err(GatewayError::ConversionFailed {
            detail: format!("exit status {code}: {}", truncate(report.warnings.trim())),
        });
    }

    if !report.diagnostics.trim().is_empty() {
        return Err(GatewayError::ConversionFailed {
            detail: format!("unexpected output: {}", truncate(report.diagnostics.trim())),
        });
    }

    if !report.warnings.trim().is_empty() {
        warn!("Engine warnings: {}", truncate(report.warnings.trim()));
    }
    Ok(())
}

fn non_empty(output: &TempArtifact) -> Result<u64, GatewayError> {
    match output.len()? {
        0 => Err(GatewayError::ConversionFailed {
            detail: "engine produced an empty file".into(),
        }),
        n => Ok(n),
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() > MAX_DETAIL_CHARS {
        let cut: String = s.chars().take(MAX_DETAIL_CHARS).collect();
        format!("{cut}\u{2026}")
    } else {
        s.to_string()
    }
}

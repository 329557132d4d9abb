//! Request-level conversion entry point.
//!
//! [`Gateway::convert`] takes the decoded form of one request and runs the
//! whole pipeline:
//!
//! 1. require `in_file` (nothing is written to disk before this check),
//! 2. parse the options,
//! 3. resolve the bibliography (may fetch a URL or stage an upload),
//! 4. build the engine arguments,
//! 5. run the engine once.
//!
//! Every temporary file it creates is released before it returns, except
//! the output artifact, which travels inside the [`ConvertedDocument`] and
//! is released by the response stream.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::options::{ConversionOptions, FormFields, FIELD_IN_FILE};
use crate::output::{ConversionOutcome, ConvertedDocument};
use crate::pipeline::args::build_arguments;
use crate::pipeline::bibliography::{BibliographyResolver, BibliographySource};
use crate::pipeline::engine::{Engine, PandocEngine};
use crate::pipeline::executor::ConversionExecutor;
use crate::pipeline::fetch::{Fetcher, HttpFetcher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Shared, stateless-per-request conversion service.
///
/// Cheap to share behind an `Arc`; requests never touch each other's files.
pub struct Gateway {
    config: GatewayConfig,
    resolver: BibliographyResolver,
    executor: ConversionExecutor,
}

impl Gateway {
    /// Build a gateway that runs the configured pandoc and fetches
    /// bibliographies over HTTP.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let engine = PandocEngine::new(
            config.pandoc_path.clone(),
            Duration::from_secs(config.engine_timeout_secs),
            config.builtin_citeproc,
        );
        let fetcher = HttpFetcher::new(config.fetch_timeout_secs)
            .map_err(|e| GatewayError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self::with_components(
            config,
            Arc::new(engine),
            Arc::new(fetcher),
        ))
    }

    /// Build a gateway around explicit engine and fetcher implementations.
    pub fn with_components(
        config: GatewayConfig,
        engine: Arc<dyn Engine>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let scratch = config.scratch_dir.clone();
        Self {
            resolver: BibliographyResolver::new(fetcher, scratch.clone()),
            executor: ConversionExecutor::new(engine, scratch),
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        self.executor.engine()
    }

    /// Convert one request.
    ///
    /// # Errors
    /// - [`GatewayError::MissingInputFile`] when `in_file` is absent or blank
    ///   (no filename and no bytes); a named zero-byte file is converted
    /// - [`GatewayError::InvalidOutputFormat`] for an unknown `output`
    /// - [`GatewayError::BibliographyFetchFailed`] when a `bib_path` URL fails
    /// - [`GatewayError::ConversionFailed`] when the engine run fails
    /// - [`GatewayError::InternalIo`] when a temp file cannot be handled
    pub async fn convert(&self, mut fields: FormFields) -> ConversionOutcome {
        let start = Instant::now();
        let input = fields
            .take_file(FIELD_IN_FILE)
            .ok_or(GatewayError::MissingInputFile)?;
        let stem = input.stem();

        let options = ConversionOptions::from_fields(&fields)?;
        info!(
            "Converting {:?} ({} bytes) to {}",
            input.filename.as_deref().unwrap_or("<unnamed>"),
            input.bytes.len(),
            options.output_format
        );
        debug!("Options: {:?}", options);

        let source = BibliographySource::from_fields(options.use_citeproc, &mut fields);
        let bibliography = self.resolver.resolve(source).await?;
        let arguments = build_arguments(&options, bibliography.path());

        let result = self
            .executor
            .execute(&input.bytes, options.output_format, arguments)
            .await;
        bibliography.release();

        let artifact = result?;
        let document = ConvertedDocument::new(artifact, &stem, options.output_format);
        info!(
            "Converted {} in {}ms",
            document.download_name,
            start.elapsed().as_millis()
        );
        Ok(document)
    }
}

//! Result types for a conversion request.

use crate::error::GatewayError;
use crate::options::OutputFormat;
use crate::pipeline::artifact::TempArtifact;

/// Content type of every successful response.
pub const DOWNLOAD_CONTENT_TYPE: &str = "application/x-download";

/// A finished conversion waiting to be sent.
///
/// Owns the output artifact; the file is deleted once the response body
/// has been streamed (see [`crate::stream::read_once`]) or when this value
/// is dropped unsent.
#[derive(Debug)]
pub struct ConvertedDocument {
    pub artifact: TempArtifact,
    /// `<stem>.<format>`, already safe to quote in a header.
    pub download_name: String,
    pub format: OutputFormat,
}

impl ConvertedDocument {
    pub fn new(artifact: TempArtifact, stem: &str, format: OutputFormat) -> Self {
        Self {
            artifact,
            download_name: format!("{stem}.{}", format.extension()),
            format,
        }
    }

    /// Value of the `Content-Disposition` header.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.download_name)
    }
}

/// Outcome of one request: the document, or the typed reason it failed.
pub type ConversionOutcome = Result<ConvertedDocument, GatewayError>;

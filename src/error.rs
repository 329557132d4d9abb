//! Error types for the pandoc-gateway library.
//!
//! Every failure a request can hit is a [`GatewayError`]. The variants are
//! grouped by who is at fault:
//!
//! * **Client input**: the upload is malformed, lacks `in_file`, or names
//!   an output format we do not produce. Mapped to `400 Bad Request`.
//! * **Upstream**: a remote bibliography could not be fetched. Mapped to
//!   `502 Bad Gateway`.
//! * **Server side**: the engine failed or a scratch file could not be
//!   written. Mapped to `500 Internal Server Error`.
//!
//! [`GatewayError::kind`] gives callers a `Copy` discriminant to branch on
//! without matching on the payload.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

/// All errors returned by the pandoc-gateway library.
#[derive(Debug, Error)]
pub enum GatewayError {
    // ── Client input ──────────────────────────────────────────────────────
    /// The multipart body could not be read.
    #[error("Malformed upload: {reason}")]
    MalformedRequest { reason: String },

    /// The request carried no `in_file` upload.
    #[error("No input file received")]
    MissingInputFile,

    /// `output` named a format outside pdf, tex, docx, html, rtf.
    #[error("Unsupported output format '{value}'\nExpected one of: pdf, tex, docx, html, rtf.")]
    InvalidOutputFormat { value: String },

    // ── Upstream ──────────────────────────────────────────────────────────
    /// A `bib_path` URL could not be downloaded.
    #[error("Failed to fetch bibliography '{url}': {reason}")]
    BibliographyFetchFailed { url: String, reason: String },

    // ── Engine ────────────────────────────────────────────────────────────
    /// pandoc could not be run, exited non-zero, printed diagnostics, or
    /// produced an empty file.
    #[error("Error running pandoc: {detail}")]
    ConversionFailed { detail: String },

    // ── I/O ───────────────────────────────────────────────────────────────
    /// A scratch file could not be created, written or opened.
    #[error("Internal I/O failure while {context}: {source}")]
    InternalIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // ── Config ────────────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Payload-free discriminant of [`GatewayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedRequest,
    MissingInputFile,
    InvalidOutputFormat,
    BibliographyFetchFailed,
    ConversionFailed,
    InternalIoFailure,
    InvalidConfig,
}

impl GatewayError {
    /// Shorthand for [`GatewayError::InternalIo`].
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        GatewayError::InternalIo {
            context: context.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::MalformedRequest { .. } => ErrorKind::MalformedRequest,
            GatewayError::MissingInputFile => ErrorKind::MissingInputFile,
            GatewayError::InvalidOutputFormat { .. } => ErrorKind::InvalidOutputFormat,
            GatewayError::BibliographyFetchFailed { .. } => ErrorKind::BibliographyFetchFailed,
            GatewayError::ConversionFailed { .. } => ErrorKind::ConversionFailed,
            GatewayError::InternalIo { .. } => ErrorKind::InternalIoFailure,
            GatewayError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// HTTP status reported to the client for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::MalformedRequest
            | ErrorKind::MissingInputFile
            | ErrorKind::InvalidOutputFormat => StatusCode::BAD_REQUEST,
            ErrorKind::BibliographyFetchFailed => StatusCode::BAD_GATEWAY,
            ErrorKind::ConversionFailed
            | ErrorKind::InternalIoFailure
            | ErrorKind::InvalidConfig => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        warn!("Request failed ({}): {}", status, self);
        (
            status,
            [("Content-Type", "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

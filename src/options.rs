//! Request options: raw multipart fields in, validated options out.
//!
//! [`FormFields`] is the transport-neutral view of a `POST /convert` body:
//! text values and uploaded files keyed by field name. The server fills it
//! from the multipart stream; tests fill it by hand.
//!
//! [`ConversionOptions::from_fields`] is total over absent fields: every
//! optional field has a documented default and absence is never an error.
//! The only rejection is an `output` value outside the five formats.

use crate::error::GatewayError;
use axum::body::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ── Field names ──────────────────────────────────────────────────────────

pub const FIELD_IN_FILE: &str = "in_file";
pub const FIELD_OUTPUT: &str = "output";
pub const FIELD_STANDALONE: &str = "standalone";
pub const FIELD_XELATEX: &str = "xelatex";
pub const FIELD_CROSSREF: &str = "crossref";
pub const FIELD_CITEPROC: &str = "citeproc";
pub const FIELD_NATBIB: &str = "natbib";
pub const FIELD_BIBLATEX: &str = "biblatex";
pub const FIELD_BIB_PATH: &str = "bib_path";
pub const FIELD_BIB_FILE: &str = "bib_file";
pub const FIELD_CSL_PATH: &str = "csl_path";

/// Characters that would break a quoted `Content-Disposition` filename.
static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\x00-\x1f\x7f"\\]"#).expect("valid regex"));

// ── Raw fields ───────────────────────────────────────────────────────────

/// A file part of the multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename, if any.
    pub filename: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(filename: Option<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename,
            bytes: bytes.into(),
        }
    }

    /// Browsers submit an untouched `<input type="file">` as a part with an
    /// empty filename and no content. That is not an upload.
    pub fn is_blank(&self) -> bool {
        self.filename.as_deref().map_or(true, |f| f.trim().is_empty()) && self.bytes.is_empty()
    }

    /// Base name of the upload without its extension, safe to embed in a
    /// quoted `Content-Disposition` filename. Falls back to `document`.
    pub fn stem(&self) -> String {
        let name = self.filename.as_deref().unwrap_or("");
        // Old browsers send the full client path; keep the last component.
        let base = name.rsplit(['/', '\\']).next().unwrap_or("");
        let stem = match base.rfind('.') {
            Some(0) | None => base,
            Some(dot) => &base[..dot],
        };
        let stem = UNSAFE_FILENAME_CHARS.replace_all(stem.trim(), "_");
        if stem.is_empty() {
            "document".to_string()
        } else {
            stem.into_owned()
        }
    }
}

/// Text values and uploaded files of one request, keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    text: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a text field. A repeated name keeps the last value.
    pub fn insert_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.text.insert(name.into(), value.into());
    }

    /// Record a file field. Blank submissions are dropped here so that every
    /// later lookup sees them as absent.
    pub fn insert_file(&mut self, name: impl Into<String>, file: UploadedFile) {
        if !file.is_blank() {
            self.files.insert(name.into(), file);
        }
    }

    /// Trimmed text value; empty counts as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.text
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Truthy-presence flag: any non-empty value turns it on, including
    /// the literal `False`. Omit a field to leave it off.
    pub fn flag(&self, name: &str) -> bool {
        self.text(name).is_some()
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

// ── Output format ────────────────────────────────────────────────────────

/// The five formats the gateway produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pdf,
    Tex,
    Docx,
    /// (default)
    #[default]
    Html,
    Rtf,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Pdf,
        OutputFormat::Tex,
        OutputFormat::Docx,
        OutputFormat::Html,
        OutputFormat::Rtf,
    ];

    /// Wire name, also used as the file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Tex => "tex",
            OutputFormat::Docx => "docx",
            OutputFormat::Html => "html",
            OutputFormat::Rtf => "rtf",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// pandoc writer name. PDF is produced by the LaTeX writer; pandoc
    /// picks the PDF route from the `.pdf` output suffix.
    pub fn pandoc_writer(&self) -> &'static str {
        match self {
            OutputFormat::Pdf | OutputFormat::Tex => "latex",
            OutputFormat::Docx => "docx",
            OutputFormat::Html => "html",
            OutputFormat::Rtf => "rtf",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GatewayError::InvalidOutputFormat {
                value: s.to_string(),
            })
    }
}

// ── Conversion options ───────────────────────────────────────────────────

/// Validated per-request options.
///
/// Built once per request by [`ConversionOptions::from_fields`] (or the
/// builder, in library use) and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Target format. Default: html.
    pub output_format: OutputFormat,
    /// Produce a complete document with header and footer. Default: false.
    pub standalone: bool,
    /// Render PDFs with xelatex. Default: false.
    pub use_xelatex: bool,
    /// Run the cross-reference filter. Default: false.
    pub use_crossref: bool,
    /// Run the citation processor. Default: false.
    ///
    /// Also gates every bibliography field: with this off, `bib_path` and
    /// `bib_file` are ignored entirely.
    pub use_citeproc: bool,
    /// Emit natbib citations (LaTeX output). Default: false.
    pub use_natbib: bool,
    /// Emit biblatex citations (LaTeX output). Default: false.
    pub use_biblatex: bool,
    /// Citation style, URL or server path, passed to pandoc untouched.
    pub csl_path: Option<String>,
}

impl ConversionOptions {
    pub fn builder() -> ConversionOptionsBuilder {
        ConversionOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Parse options from raw request fields.
    ///
    /// # Errors
    /// [`GatewayError::InvalidOutputFormat`] when `output` is present but
    /// not one of pdf, tex, docx, html, rtf.
    pub fn from_fields(fields: &FormFields) -> Result<Self, GatewayError> {
        let output_format = match fields.text(FIELD_OUTPUT) {
            Some(v) => v.parse()?,
            None => OutputFormat::default(),
        };

        Ok(Self {
            output_format,
            standalone: fields.flag(FIELD_STANDALONE),
            use_xelatex: fields.flag(FIELD_XELATEX),
            use_crossref: fields.flag(FIELD_CROSSREF),
            use_citeproc: fields.flag(FIELD_CITEPROC),
            use_natbib: fields.flag(FIELD_NATBIB),
            use_biblatex: fields.flag(FIELD_BIBLATEX),
            csl_path: fields.text(FIELD_CSL_PATH).map(str::to_string),
        })
    }
}

/// Builder for [`ConversionOptions`].
#[derive(Debug)]
pub struct ConversionOptionsBuilder {
    options: ConversionOptions,
}

impl ConversionOptionsBuilder {
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.options.output_format = format;
        self
    }

    pub fn standalone(mut self, v: bool) -> Self {
        self.options.standalone = v;
        self
    }

    pub fn xelatex(mut self, v: bool) -> Self {
        self.options.use_xelatex = v;
        self
    }

    pub fn crossref(mut self, v: bool) -> Self {
        self.options.use_crossref = v;
        self
    }

    pub fn citeproc(mut self, v: bool) -> Self {
        self.options.use_citeproc = v;
        self
    }

    pub fn natbib(mut self, v: bool) -> Self {
        self.options.use_natbib = v;
        self
    }

    pub fn biblatex(mut self, v: bool) -> Self {
        self.options.use_biblatex = v;
        self
    }

    pub fn csl_path(mut self, path: impl Into<String>) -> Self {
        self.options.csl_path = Some(path.into());
        self
    }

    pub fn build(self) -> ConversionOptions {
        self.options
    }
}

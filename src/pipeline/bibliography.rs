//! Bibliography resolution: turn the three competing request fields into
//! at most one local path for the citation processor.
//!
//! ## Precedence
//!
//! ```text
//! citeproc off ─────────────────────────────▶ None   (fields ignored)
//! citeproc on ─┬─ bib_file uploaded ─────────▶ InlineUpload    → staged .bib
//!              ├─ bib_path is scheme://host ─▶ RemoteReference → fetched, staged .bib
//!              ├─ bib_path is anything else ─▶ ServerPath      → passed through as-is
//!              └─ nothing ───────────────────▶ None
//! ```
//!
//! Classification ([`BibliographySource::classify`]) is pure; only
//! [`BibliographyResolver::resolve`] touches the network or the disk.
//!
//! A server path is not checked for existence here. pandoc reports a
//! missing file itself, and checking first would only race with it.
//! Likewise citeproc without any bibliography is not an error at this
//! layer. The CSL field needs no resolution: pandoc fetches style URLs
//! on its own, so it stays in [`crate::options::ConversionOptions`].

use crate::error::GatewayError;
use crate::options::{FormFields, FIELD_BIB_FILE, FIELD_BIB_PATH};
use crate::pipeline::artifact::TempArtifact;
use crate::pipeline::fetch::Fetcher;
use axum::body::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// `scheme://` at the very start, as written in RFC 3986.
static URL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("valid regex"));

/// Parse `text` as an absolute URL in strict `scheme://host...` form.
///
/// The scheme is not restricted here; the fetcher rejects schemes it cannot
/// download. Forms the WHATWG parser would repair, such as `http:srv/x.bib`,
/// are not URLs.
pub fn parse_url(text: &str) -> Option<Url> {
    let text = text.trim();
    if !URL_PREFIX.is_match(text) {
        return None;
    }
    let url = Url::parse(text).ok()?;
    url.host_str().is_some_and(|h| !h.is_empty()).then_some(url)
}

/// Check if the text is a URL with a scheme and a host.
pub fn is_valid_url(text: &str) -> bool {
    parse_url(text).is_some()
}

/// Where the bibliography for this request comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BibliographySource {
    /// No bibliography argument will be passed.
    None,
    /// Contents of the `bib_file` upload.
    InlineUpload(Bytes),
    /// `bib_path` was a URL.
    RemoteReference(Url),
    /// `bib_path` was anything else; a path on this server.
    ServerPath(PathBuf),
}

impl BibliographySource {
    /// Apply the precedence rules. Deterministic and side-effect free.
    pub fn classify(use_citeproc: bool, upload: Option<Bytes>, text: Option<&str>) -> Self {
        if !use_citeproc {
            return BibliographySource::None;
        }
        if let Some(bytes) = upload {
            return BibliographySource::InlineUpload(bytes);
        }
        match text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => match parse_url(t) {
                Some(url) => BibliographySource::RemoteReference(url),
                None => BibliographySource::ServerPath(PathBuf::from(t)),
            },
            None => BibliographySource::None,
        }
    }

    /// Classify from the raw request fields, taking ownership of `bib_file`.
    pub fn from_fields(use_citeproc: bool, fields: &mut FormFields) -> Self {
        let upload = fields.take_file(FIELD_BIB_FILE).map(|f| f.bytes);
        Self::classify(use_citeproc, upload, fields.text(FIELD_BIB_PATH))
    }
}

/// The resolved bibliography, keeping any staged file alive.
#[derive(Debug)]
pub enum ResolvedBibliography {
    None,
    /// A server path passed through verbatim.
    Local(PathBuf),
    /// Uploaded or downloaded bytes staged into a `.bib` temp file.
    Staged(TempArtifact),
}

impl ResolvedBibliography {
    /// Path to hand to the engine, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ResolvedBibliography::None => None,
            ResolvedBibliography::Local(p) => Some(p),
            ResolvedBibliography::Staged(a) => Some(a.path()),
        }
    }

    /// Delete any staged file. No-op for the other cases.
    pub fn release(self) {
        if let ResolvedBibliography::Staged(artifact) = self {
            artifact.release();
        }
    }
}

/// Materialises a [`BibliographySource`] into a local path.
pub struct BibliographyResolver {
    fetcher: Arc<dyn Fetcher>,
    scratch_dir: Option<PathBuf>,
}

impl BibliographyResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, scratch_dir: Option<PathBuf>) -> Self {
        Self {
            fetcher,
            scratch_dir,
        }
    }

    /// Resolve the source to a local path.
    ///
    /// # Errors
    /// - [`GatewayError::BibliographyFetchFailed`] when a URL cannot be downloaded
    /// - [`GatewayError::InternalIo`] when the `.bib` temp file cannot be written
    pub async fn resolve(
        &self,
        source: BibliographySource,
    ) -> Result<ResolvedBibliography, GatewayError> {
        let resolved = match source {
            BibliographySource::None => ResolvedBibliography::None,
            BibliographySource::ServerPath(path) => ResolvedBibliography::Local(path),
            BibliographySource::InlineUpload(bytes) => {
                debug!("Staging uploaded bibliography ({} bytes)", bytes.len());
                ResolvedBibliography::Staged(self.stage(&bytes)?)
            }
            BibliographySource::RemoteReference(url) => {
                let bytes = self.fetcher.fetch(&url).await.map_err(|e| {
                    GatewayError::BibliographyFetchFailed {
                        url: url.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                ResolvedBibliography::Staged(self.stage(&bytes)?)
            }
        };

        if let Some(path) = resolved.path() {
            info!("Using bibliography: {}", path.display());
        }
        Ok(resolved)
    }

    fn stage(&self, bytes: &[u8]) -> Result<TempArtifact, GatewayError> {
        TempArtifact::with_contents(".bib", self.scratch_dir.as_deref(), bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::options::UploadedFile;
    use crate::pipeline::fetch::FetchError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingFetcher {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Fetcher for RecordingFetcher {
        async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            if self.fail {
                Err(FetchError::Status { status: 404 })
            } else {
                Ok(b"@book{remote, title={Remote}}".to_vec())
            }
        }
    }

    fn resolver(fetcher: Arc<RecordingFetcher>, dir: &TempDir) -> BibliographyResolver {
        BibliographyResolver::new(fetcher, Some(dir.path().to_path_buf()))
    }

    #[test]
    fn test_is_valid_url() {
        assert!(is_valid_url("https://example.com/x.bib"));
        assert!(is_valid_url("http://example.com"));
        assert!(!is_valid_url("/srv/x.bib"));
        assert!(!is_valid_url("x.bib"));
        assert!(is_valid_url("ftp://example.com/x.bib"));
        assert!(is_valid_url(" HTTPS://Example.com/x.bib "));
        assert!(!is_valid_url("file:///srv/x.bib"), "no host");
        assert!(!is_valid_url("http:srv/x.bib"));
        assert!(!is_valid_url("https:example.com"));
        assert!(!is_valid_url("C:\\bib\\x.bib"));
        assert!(!is_valid_url("https://"));
        assert!(!is_valid_url("example.com/x.bib"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn citeproc_off_ignores_everything() {
        let src = BibliographySource::classify(
            false,
            Some(Bytes::from_static(b"@book{}")),
            Some("https://example.com/x.bib"),
        );
        assert_eq!(src, BibliographySource::None);
    }

    #[test]
    fn upload_beats_text() {
        let src = BibliographySource::classify(
            true,
            Some(Bytes::from_static(b"@book{up}")),
            Some("https://example.com/x.bib"),
        );
        assert_eq!(src, BibliographySource::InlineUpload(Bytes::from_static(b"@book{up}")));
    }

    #[test]
    fn text_is_url_or_path() {
        assert!(matches!(
            BibliographySource::classify(true, None, Some("https://example.com/x.bib")),
            BibliographySource::RemoteReference(_)
        ));
        assert_eq!(
            BibliographySource::classify(true, None, Some("/srv/x.bib")),
            BibliographySource::ServerPath(PathBuf::from("/srv/x.bib"))
        );
        assert!(matches!(
            BibliographySource::classify(true, None, Some("ftp://example.com/x.bib")),
            BibliographySource::RemoteReference(_)
        ));
        assert_eq!(
            BibliographySource::classify(true, None, Some("http:srv/x.bib")),
            BibliographySource::ServerPath(PathBuf::from("http:srv/x.bib"))
        );
        assert_eq!(
            BibliographySource::classify(true, None, Some("   ")),
            BibliographySource::None
        );
        assert_eq!(BibliographySource::classify(true, None, None), BibliographySource::None);
    }

    #[test]
    fn from_fields_takes_upload() {
        let mut fields = FormFields::new();
        fields.insert_file("bib_file", UploadedFile::new(Some("refs.bib".into()), "@book{a}"));
        fields.insert_text("bib_path", "/srv/x.bib");
        let src = BibliographySource::from_fields(true, &mut fields);
        assert!(matches!(src, BibliographySource::InlineUpload(_)));
        assert!(fields.file("bib_file").is_none());
    }

    #[tokio::test]
    async fn url_fetched_once_and_staged() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher::default());
        let r = resolver(Arc::clone(&fetcher), &dir);

        let url = Url::parse("https://example.com/x.bib").unwrap();
        let resolved = r.resolve(BibliographySource::RemoteReference(url)).await.unwrap();

        assert_eq!(
            *fetcher.calls.lock().unwrap(),
            vec!["https://example.com/x.bib".to_string()]
        );
        let path = resolved.path().unwrap().to_path_buf();
        assert_eq!(path.extension().unwrap(), "bib");
        assert_eq!(std::fs::read(&path).unwrap(), b"@book{remote, title={Remote}}");

        resolved.release();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn server_path_passes_through_without_fetch() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher::default());
        let r = resolver(Arc::clone(&fetcher), &dir);

        let resolved = r
            .resolve(BibliographySource::ServerPath(PathBuf::from("/srv/x.bib")))
            .await
            .unwrap();

        assert_eq!(resolved.path(), Some(Path::new("/srv/x.bib")));
        assert!(fetcher.calls.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn upload_staged_to_bib_file() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher::default());
        let r = resolver(Arc::clone(&fetcher), &dir);

        let resolved = r
            .resolve(BibliographySource::InlineUpload(Bytes::from_static(b"@book{up}")))
            .await
            .unwrap();
        let path = resolved.path().unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"@book{up}");
        assert!(fetcher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_allocates_nothing() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher {
            fail: true,
            ..Default::default()
        });
        let r = resolver(fetcher, &dir);

        let url = Url::parse("https://example.com/missing.bib").unwrap();
        let err = r
            .resolve(BibliographySource::RemoteReference(url))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BibliographyFetchFailed);
        assert!(err.to_string().contains("HTTP 404"), "got: {err}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

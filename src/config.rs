//! Process-lifetime configuration for the gateway.
//!
//! Everything that does not vary per request lives in [`GatewayConfig`]:
//! where to listen, which pandoc binary to run, where scratch files go and
//! how long the two blocking collaborators (network fetch, engine run) may
//! take. It is built once at startup via [`GatewayConfigBuilder`] and never
//! mutated afterwards; requests only ever read it.

use crate::error::GatewayError;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for a gateway instance.
///
/// # Example
/// ```rust
/// use pandoc_gateway::GatewayConfig;
///
/// let config = GatewayConfig::builder()
///     .listen_addr("0.0.0.0:9000".parse().unwrap())
///     .pandoc_path("/usr/local/bin/pandoc")
///     .engine_timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.listen_addr.port(), 9000);
/// ```
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address the HTTP server binds. Default: `127.0.0.1:8080`.
    pub listen_addr: SocketAddr,

    /// Path or name of the pandoc executable. Default: `pandoc` (resolved via `PATH`).
    pub pandoc_path: PathBuf,

    /// Directory in which request-scoped temp files are created.
    /// Default: `None`, meaning the system temp directory.
    pub scratch_dir: Option<PathBuf>,

    /// Timeout for downloading a remote `bib_path` in seconds. Default: 120.
    pub fetch_timeout_secs: u64,

    /// Timeout for a single pandoc run in seconds. Default: 300.
    ///
    /// PDF output goes through a full LaTeX run, which can take tens of
    /// seconds on a large document; the child is killed when this elapses.
    pub engine_timeout_secs: u64,

    /// Maximum accepted request body in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,

    /// Render the citation filter as pandoc's built-in `--citeproc`
    /// rather than `--filter pandoc-citeproc`. Default: true.
    ///
    /// The external `pandoc-citeproc` filter was removed in pandoc 2.11.
    /// Disable this only when running against an older pandoc.
    pub builtin_citeproc: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            pandoc_path: PathBuf::from("pandoc"),
            scratch_dir: None,
            fetch_timeout_secs: 120,
            engine_timeout_secs: 300,
            max_upload_bytes: 50 * 1024 * 1024,
            builtin_citeproc: true,
        }
    }
}

impl GatewayConfig {
    /// Create a new builder for `GatewayConfig`.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Debug)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.config.listen_addr = addr;
        self
    }

    pub fn pandoc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pandoc_path = path.into();
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = Some(dir.into());
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn engine_timeout_secs(mut self, secs: u64) -> Self {
        self.config.engine_timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn builtin_citeproc(mut self, v: bool) -> Self {
        self.config.builtin_citeproc = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GatewayConfig, GatewayError> {
        let c = &self.config;
        if c.fetch_timeout_secs == 0 {
            return Err(GatewayError::InvalidConfig(
                "Fetch timeout must be ≥ 1 second".into(),
            ));
        }
        if c.engine_timeout_secs == 0 {
            return Err(GatewayError::InvalidConfig(
                "Engine timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(GatewayError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        if c.pandoc_path.as_os_str().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "pandoc path must not be empty".into(),
            ));
        }
        if let Some(ref dir) = c.scratch_dir {
            if !dir.is_dir() {
                return Err(GatewayError::InvalidConfig(format!(
                    "Scratch directory '{}' does not exist",
                    dir.display()
                )));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_legacy_port() {
        let c = GatewayConfig::default();
        assert_eq!(c.listen_addr.port(), 8080);
        assert_eq!(c.pandoc_path, PathBuf::from("pandoc"));
        assert!(c.scratch_dir.is_none());
        assert!(c.builtin_citeproc);
    }

    #[test]
    fn zero_timeouts_rejected() {
        let err = GatewayConfig::builder()
            .engine_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Engine timeout"), "got: {err}");

        let err = GatewayConfig::builder()
            .fetch_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Fetch timeout"), "got: {err}");
    }

    #[test]
    fn missing_scratch_dir_rejected() {
        let err = GatewayConfig::builder()
            .scratch_dir("/definitely/not/a/real/dir")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"), "got: {err}");
    }

    #[test]
    fn existing_scratch_dir_accepted() {
        let dir = tempfile::TempDir::new().unwrap();
        let c = GatewayConfig::builder()
            .scratch_dir(dir.path())
            .max_upload_bytes(1024)
            .build()
            .unwrap();
        assert_eq!(c.scratch_dir.as_deref(), Some(dir.path()));
        assert_eq!(c.max_upload_bytes, 1024);
    }
}

//! Request-scoped temp files.
//!
//! A [`TempArtifact`] is a uniquely named file with a role-specific suffix
//! (`.md` input, `.bib` bibliography, `.<format>` output). Uniqueness comes
//! from [`tempfile`], so concurrent requests sharing one scratch directory
//! never collide.
//!
//! Cleanup is tied to ownership: dropping the artifact deletes the file on
//! every exit path, early returns and panics included. [`TempArtifact::release`]
//! does the same but reports a failed delete through `tracing` instead of
//! ignoring it. A failed delete is never turned into a request error.

use crate::error::GatewayError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const PREFIX: &str = "pandoc-gateway-";

/// An ephemeral, uniquely named file owned by one request.
#[derive(Debug)]
pub struct TempArtifact {
    file: NamedTempFile,
}

impl TempArtifact {
    /// Create an empty artifact. `suffix` includes the dot, e.g. `".md"`.
    ///
    /// `dir` of `None` means the system temp directory.
    pub fn create(suffix: &str, dir: Option<&Path>) -> Result<Self, GatewayError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX).suffix(suffix);
        let file = match dir {
            Some(d) => builder.tempfile_in(d),
            None => builder.tempfile(),
        }
        .map_err(|e| GatewayError::io(format!("creating {suffix} temp file"), e))?;
        debug!("Allocated temp artifact {}", file.path().display());
        Ok(Self { file })
    }

    /// Create an artifact holding `bytes`, flushed to disk.
    pub fn with_contents(
        suffix: &str,
        dir: Option<&Path>,
        bytes: &[u8],
    ) -> Result<Self, GatewayError> {
        let mut artifact = Self::create(suffix, dir)?;
        artifact
            .file
            .write_all(bytes)
            .and_then(|_| artifact.file.flush())
            .map_err(|e| GatewayError::io(format!("writing {suffix} temp file"), e))?;
        Ok(artifact)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Current size on disk. The engine writes through the path, not our
    /// handle, so this always asks the filesystem.
    pub fn len(&self) -> Result<u64, GatewayError> {
        std::fs::metadata(self.path())
            .map(|m| m.len())
            .map_err(|e| GatewayError::io("reading output size", e))
    }

    pub fn is_empty(&self) -> Result<bool, GatewayError> {
        self.len().map(|n| n == 0)
    }

    /// Delete the file now, logging (not returning) any failure.
    pub fn release(self) {
        let path = self.to_path_buf();
        match self.file.close() {
            Ok(()) => debug!("Released temp artifact {}", path.display()),
            Err(e) => warn!("Failed to remove temp artifact {}: {}", path.display(), e),
        }
    }
}

//! Output delivery
//!
//! The save/download step is an external service to the capture core. It is
//! modeled as a trait so exporters stay decoupled from the filesystem and
//! tests can capture delivered bytes instead of writing them.

use crate::error::{ExportError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Destination for finished exports.
pub trait SaveSink: Send + Sync {
    /// Deliver `bytes` under `suggested`, a relative path including the
    /// `Screenshots/` prefix. `interactive` asks the sink to involve the
    /// user in choosing the final location; sinks without that capability
    /// ignore it. Returns the path the bytes actually landed at.
    fn deliver(&self, bytes: &[u8], suggested: &Path, interactive: bool) -> Result<PathBuf>;
}

/// Writes exports into a directory tree under a fixed root.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Create a sink rooted at `root`. The directory need not exist yet.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// The configured root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SaveSink for DirectorySink {
    fn deliver(&self, bytes: &[u8], suggested: &Path, _interactive: bool) -> Result<PathBuf> {
        let target = self.root.join(suggested);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ExportError::SaveFailed(format!("creating {}: {e}", parent.display()))
            })?;
        }

        fs::write(&target, bytes)
            .map_err(|e| ExportError::SaveFailed(format!("writing {}: {e}", target.display())))?;

        info!("Saved {} bytes to {}", bytes.len(), target.display());
        Ok(target)
    }
}

//! Per-run scratch workspace
//!
//! Every grading run owns one freshly created temp directory holding the
//! submitted source and the compiled artifact. Directories are never shared
//! or reused across runs. Reclamation is guaranteed on every exit path: the
//! pipeline calls `reclaim` explicitly, and the `TempDir` drop guard covers
//! early returns and panics.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{ARTIFACT_FILE, SOURCE_FILE};
use crate::error::GraderError;

/// Exclusive scratch directory for one grading run.
#[derive(Debug)]
pub struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    /// Create a fresh, uniquely named workspace.
    ///
    /// This is the one failure that aborts a grading run outright: without
    /// a workspace there is nothing to grade into.
    pub fn create() -> Result<Self, GraderError> {
        let dir = tempfile::Builder::new()
            .prefix("cgrader-")
            .tempdir()
            .map_err(GraderError::CreateWorkspace)?;
        debug!("Created workspace at {:?}", dir.path());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the submitted source as `main.c` inside the workspace.
    pub fn write_source(&self, source: &str) -> Result<PathBuf, GraderError> {
        let source_path = self.dir.path().join(SOURCE_FILE);
        std::fs::write(&source_path, source).map_err(GraderError::WriteSource)?;
        Ok(source_path)
    }

    /// Path where the compiler command is expected to leave the artifact.
    pub fn artifact_path(&self) -> PathBuf {
        self.dir.path().join(ARTIFACT_FILE)
    }

    /// Delete the workspace. Failures are logged and swallowed; a leftover
    /// directory must never fail the grading run it belongs to.
    pub fn reclaim(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Reclaimed workspace {:?}", path),
            Err(e) => warn!("Failed to reclaim workspace {:?}: {}", path, e),
        }
    }
}

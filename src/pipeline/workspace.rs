//! Per-request scratch directory.
//!
//! Every conversion gets its own `pdfworkdir-XXXX` directory holding the
//! uploaded `input.pdf` and, when requested, an `images/` folder for
//! `pdfimages` output. Concurrent requests never share files, so no locking
//! is needed.
//!
//! The directory is owned by a [`TempDir`]: dropping the [`Workspace`]
//! removes it recursively on every exit path, including early `?` returns,
//! panics and a handler future cancelled because the client went away.

use crate::error::Pdf2JsonError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

const DIR_PREFIX: &str = "pdfworkdir-";
const INPUT_FILE: &str = "input.pdf";
const IMAGES_DIR: &str = "images";

/// An isolated temporary directory tree for one conversion.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    input_path: PathBuf,
    images_dir: PathBuf,
}

impl Workspace {
    /// Create a fresh workspace under `parent`, or the system temp dir.
    pub fn create(parent: Option<&Path>) -> Result<Self, Pdf2JsonError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(DIR_PREFIX);
        let dir = match parent {
            Some(p) => builder.tempdir_in(p),
            None => builder.tempdir(),
        }
        .map_err(|source| Pdf2JsonError::Workspace { source })?;

        debug!("Created workspace {}", dir.path().display());

        Ok(Self {
            input_path: dir.path().join(INPUT_FILE),
            images_dir: dir.path().join(IMAGES_DIR),
            dir,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Where the uploaded PDF is staged.
    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Output directory for extracted images. Only exists after
    /// [`Workspace::create_images_dir`].
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub async fn create_images_dir(&self) -> Result<&Path, Pdf2JsonError> {
        tokio::fs::create_dir(&self.images_dir)
            .await
            .map_err(|source| Pdf2JsonError::Workspace { source })?;
        Ok(&self.images_dir)
    }

    /// Remove the workspace now. Failures are logged, never returned.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Removed workspace {}", path.display()),
            Err(e) => warn!("Failed to remove workspace {}: {}", path.display(), e),
        }
    }
}

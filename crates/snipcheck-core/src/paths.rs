//! Scratch directory management.
//!
//! Every snippet is written to its own file inside a scratch directory that
//! lives directly under the project root, so relative imports written by the
//! [`LocalImportSubstituter`](crate::LocalImportSubstituter) resolve against
//! the package:
//!
//! ```text
//! my-package/
//! ├── package.json
//! ├── tsconfig.json
//! ├── src/
//! └── compiled-docs/          # removed again when the run finishes
//!     ├── block-1.ts
//!     ├── tsconfig-1.json
//!     └── ...
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default name of the scratch directory.
pub const DEFAULT_SCRATCH_DIR: &str = "compiled-docs";

/// Prefix of every snippet file written to the scratch directory.
pub(crate) const BLOCK_FILE_PREFIX: &str = "block-";

/// Handle to the per-run scratch directory.
///
/// The handle is owned by one [`SnippetCompiler`](crate::SnippetCompiler);
/// two compilers only share a directory if they are configured with the
/// same name under the same root.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    /// Name of the directory (single path component).
    name: String,

    /// Absolute or root-relative path of the directory.
    path: PathBuf,
}

impl ScratchDir {
    /// Create a handle for `<project_root>/<name>`. Nothing is touched on disk.
    pub fn new(project_root: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        let path = project_root.join(&name);
        Self { name, path }
    }

    /// Directory name, as it appears in compiler diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Relative reference from inside the scratch directory to the project root.
    pub fn root_reference(&self) -> &'static str {
        ".."
    }

    /// Path of the snippet file for a block id.
    pub fn block_path(&self, id: u64) -> PathBuf {
        self.path.join(format!("{BLOCK_FILE_PREFIX}{id}.ts"))
    }

    /// Remove any stale copy of the directory and create it fresh.
    pub async fn reset(&self) -> Result<()> {
        self.remove().await?;
        tokio::fs::create_dir_all(&self.path)
            .await
            .map_err(|source| self.error(source))?;
        tracing::debug!("Created scratch directory {}", self.path.display());
        Ok(())
    }

    /// Remove the directory. Absence is not an error.
    pub async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.error(source)),
        }
    }

    /// Reset the directory and return a guard that removes it again.
    ///
    /// Call [`ScratchGuard::release`] on the normal exit path. If the guard is
    /// dropped instead (early return, panic, or the future being dropped) the
    /// directory is removed synchronously.
    pub async fn acquire(&self) -> Result<ScratchGuard<'_>> {
        self.reset().await?;
        Ok(ScratchGuard {
            dir: self,
            armed: true,
        })
    }

    fn error(&self, source: std::io::Error) -> Error {
        Error::ScratchDir {
            path: self.path.clone(),
            source,
        }
    }
}

/// Removes the scratch directory when the run ends.
#[must_use = "dropping the guard removes the scratch directory immediately"]
pub struct ScratchGuard<'a> {
    dir: &'a ScratchDir,
    armed: bool,
}

impl ScratchGuard<'_> {
    /// Remove the directory asynchronously and disarm the guard.
    pub async fn release(mut self) -> Result<()> {
        self.armed = false;
        self.dir.remove().await
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_dir_all(&self.dir.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove scratch directory {}: {}",
                self.dir.path.display(),
                e
            ),
        }
    }
}

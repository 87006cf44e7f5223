//! Temporary bundle directories.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Temporary directory of `<code>.json` bundle files.
#[derive(Debug)]
pub struct BundleDir {
    _dir: TempDir,
    path: Utf8PathBuf,
}

impl BundleDir {
    /// Create an empty bundle directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or its path is
    /// not UTF-8.
    pub fn new() -> anyhow::Result<Self> {
        let dir = TempDir::new()?;
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| anyhow::anyhow!("non-UTF-8 temp dir {}", path.display()))?;
        Ok(Self { _dir: dir, path })
    }

    /// Write `file_name` with `contents`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn write(&self, file_name: &str, contents: &str) -> anyhow::Result<Utf8PathBuf> {
        let target = self.path.join(file_name);
        fs::write(&target, contents)?;
        Ok(target)
    }

    /// Directory path.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

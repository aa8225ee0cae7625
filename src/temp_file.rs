use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tokio::fs::OpenOptions;

const PREFIX: &str = "tube-grab-";

/// Owned temporary file. The file is removed when the guard is dropped,
/// whichever way the owning step exits.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reserves a fresh, uniquely named file in `dir`.
    pub async fn create_in(dir: &Path, ext: &str) -> io::Result<Self> {
        let path = dir.join(format!("{}{}.{}", PREFIX, uuid::Uuid::new_v4(), ext));
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                log::warn!("Failed to remove temporary file {:?}: {}", self.path, e);
            }
        }
    }
}

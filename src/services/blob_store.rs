// Markhub Blob Store
// Storage for snapshot blobs: the contract a remote file store (e.g. WebDAV) exposes,
// and a directory-rooted implementation of it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::types::errors::BlobStoreError;

/// One entry returned by [`BlobStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    pub name: String,
    pub mod_time: DateTime<Utc>,
    pub is_dir: bool,
}

/// Trait defining the blob store used for snapshot backup and restore.
///
/// Paths are `/`-separated and relative to the store root.
pub trait BlobStore {
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), BlobStoreError>;
    /// Fails with [`BlobStoreError::NotFound`] when nothing exists at `path`.
    fn read(&self, path: &str) -> Result<Vec<u8>, BlobStoreError>;
    fn list(&self, dir: &str) -> Result<Vec<BlobEntry>, BlobStoreError>;
    fn mkdir_all(&self, path: &str) -> Result<(), BlobStoreError>;
}

/// Joins blob path segments with `/`, skipping empty segments.
pub fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name.trim_start_matches('/'))
    }
}

/// Blob store rooted at a local directory.
pub struct DirectoryBlobStore {
    root: PathBuf,
}

impl DirectoryBlobStore {
    /// Creates a store rooted at `root`. The directory is created lazily.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Maps a blob path to a file system path under the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, BlobStoreError> {
        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(BlobStoreError::InvalidPath(path.to_string())),
            }
        }
        Ok(resolved)
    }

    fn io_error(path: &str, source: std::io::Error) -> BlobStoreError {
        if source.kind() == ErrorKind::NotFound {
            BlobStoreError::NotFound(path.to_string())
        } else {
            BlobStoreError::Io { path: path.to_string(), source }
        }
    }
}

impl BlobStore for DirectoryBlobStore {
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), BlobStoreError> {
        let target = self.resolve(path)?;
        fs::write(&target, bytes).map_err(|e| Self::io_error(path, e))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, BlobStoreError> {
        let target = self.resolve(path)?;
        if target.is_dir() {
            return Err(BlobStoreError::NotFound(path.to_string()));
        }
        fs::read(&target).map_err(|e| Self::io_error(path, e))
    }

    fn list(&self, dir: &str) -> Result<Vec<BlobEntry>, BlobStoreError> {
        let target = self.resolve(dir)?;
        let mut entries = Vec::new();
        for entry in fs::read_dir(&target).map_err(|e| Self::io_error(dir, e))? {
            let entry = entry.map_err(|e| Self::io_error(dir, e))?;
            let metadata = entry.metadata().map_err(|e| Self::io_error(dir, e))?;
            let modified = metadata.modified().map_err(|e| Self::io_error(dir, e))?;
            entries.push(BlobEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                mod_time: DateTime::<Utc>::from(modified),
                is_dir: metadata.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn mkdir_all(&self, path: &str) -> Result<(), BlobStoreError> {
        let target = self.resolve(path)?;
        fs::create_dir_all(&target).map_err(|e| Self::io_error(path, e))
    }
}

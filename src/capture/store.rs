//! Blob stores for finished collages.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use log::info;
use serde::Serialize;
use walkdir::WalkDir;

use crate::capture::{generate_filename, BlobStore};
use crate::error::{BoothError, Result};

/// Extensions reported by [`FsBlobStore::list`]
const LISTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// A photo previously written to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredPhoto {
    pub filename: String,
    pub size: u64,
    pub modified: DateTime<Local>,
}

/// Writes collages into a photos directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    /// Open the store, creating `dir` if it does not exist.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| BoothError::PersistFailure {
                reason: format!("cannot create photos directory {}", dir.display()),
                source: Some(e),
            })?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a stored file by name.
    ///
    /// Names containing path separators or `..` never resolve, so callers
    /// can pass user-supplied names straight through.
    pub fn path_of(&self, name: &str) -> Result<PathBuf> {
        let not_found = || BoothError::PhotoNotFound {
            name: name.to_string(),
        };

        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(not_found());
        }

        let path = self.dir.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(not_found())
        }
    }

    /// Stored photos, newest first.
    pub fn list(&self) -> Result<Vec<StoredPhoto>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut photos = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
        {
            let filename = entry.file_name().to_string_lossy().to_string();
            let listed = Path::new(&filename)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| LISTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false);
            if !listed {
                continue;
            }

            let metadata = entry.metadata().map_err(std::io::Error::from)?;
            photos.push(StoredPhoto {
                filename,
                size: metadata.len(),
                modified: DateTime::<Local>::from(metadata.modified()?),
            });
        }

        photos.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.filename.cmp(&a.filename))
        });
        Ok(photos)
    }
}

impl BlobStore for FsBlobStore {
    fn save(&self, bytes: &[u8]) -> Result<String> {
        let filename = generate_filename(&Local::now());
        let path = self.dir.join(&filename);

        fs::write(&path, bytes).map_err(|e| BoothError::PersistFailure {
            reason: format!("failed to write {}", path.display()),
            source: Some(e),
        })?;

        info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(filename)
    }
}

/// Keeps saved blobs in memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<Vec<(String, Vec<u8>)>>,
    fail_saves: bool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every save fails with `PersistFailure`
    pub fn failing() -> Self {
        Self {
            blobs: Mutex::new(Vec::new()),
            fail_saves: true,
        }
    }

    /// Snapshot of everything saved so far, in save order
    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.blobs.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn get(&self, filename: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .find(|(name, _)| name == filename)
            .map(|(_, bytes)| bytes.clone())
    }
}

impl BlobStore for MemoryBlobStore {
    fn save(&self, bytes: &[u8]) -> Result<String> {
        if self.fail_saves {
            return Err(BoothError::PersistFailure {
                reason: "memory store configured to fail".to_string(),
                source: None,
            });
        }

        let filename = generate_filename(&Local::now());
        self.blobs
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((filename.clone(), bytes.to_vec()));
        Ok(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_fs_store_creates_directory_and_saves() {
        let dir = tempdir().unwrap();
        let photos = dir.path().join("nested").join("photos");
        let store = FsBlobStore::open(&photos).unwrap();
        assert!(photos.is_dir());

        let name = store.save(b"jpeg bytes").unwrap();
        let path = store.path_of(&name).unwrap();
        assert_eq!(fs::read(path).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn test_path_of_rejects_traversal() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path().join("photos")).unwrap();
        fs::write(dir.path().join("secret.jpg"), b"x").unwrap();

        for name in ["../secret.jpg", "", "a/b.jpg", "missing.jpg"] {
            assert!(matches!(
                store.path_of(name),
                Err(BoothError::PhotoNotFound { .. })
            ));
        }
    }

    #[test]
    fn test_list_filters_extensions() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("a.jpg"), b"12345").unwrap();
        fs::write(dir.path().join("b.PNG"), b"12").unwrap();
        fs::write(dir.path().join("c.txt"), b"ignored").unwrap();

        let listed = store.list().unwrap();
        let mut names: Vec<&str> = listed.iter().map(|p| p.filename.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["a.jpg", "b.PNG"]);
        let a = listed.iter().find(|p| p.filename == "a.jpg").unwrap();
        assert_eq!(a.size, 5);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryBlobStore::new();
        let name = store.save(&[1, 2, 3]).unwrap();
        assert_eq!(store.get(&name), Some(vec![1, 2, 3]));
        assert_eq!(store.saved().len(), 1);

        let failing = MemoryBlobStore::failing();
        assert!(matches!(
            failing.save(&[1]),
            Err(BoothError::PersistFailure { .. })
        ));
    }
}

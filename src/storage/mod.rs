use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),
}

/// Raw-bytes archive for original uploads. The pipeline works on extracted
/// text; the original payload is kept here for audit and re-processing.
pub trait ObjectStore: Send + Sync {
    /// Store the payload under a key derived from the document id and
    /// original filename. Returns the key.
    fn put(&self, document_id: &Uuid, filename: &str, bytes: &[u8])
        -> Result<String, StorageError>;

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// A time-limited locator a client can fetch the object from. The
    /// local store has no expiry mechanism and ignores the TTL; a remote
    /// backend would sign the URL with it.
    fn presigned_url(&self, key: &str, ttl_secs: u64) -> Result<String, StorageError>;

    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Filesystem-backed store. Objects live under `<root>/<doc_id>/<filename>`.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        // Keys are relative and must not escape the root.
        if key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(
        &self,
        document_id: &Uuid,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let safe_name = sanitize_filename(filename);
        let key = format!("{document_id}/{safe_name}");
        let full_path = self.resolve(&key)?;

        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full_path, bytes)?;
        Ok(key)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let full_path = self.resolve(key)?;
        if !full_path.exists() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(std::fs::read(&full_path)?)
    }

    fn presigned_url(&self, key: &str, _ttl_secs: u64) -> Result<String, StorageError> {
        let full_path = self.resolve(key)?;
        if !full_path.exists() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(format!("file://{}", full_path.display()))
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let full_path = self.resolve(key)?;
        if !full_path.exists() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        std::fs::remove_file(&full_path)?;
        Ok(())
    }
}

/// Strip path separators and control characters so a hostile filename
/// cannot influence where the object lands.
fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control())
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

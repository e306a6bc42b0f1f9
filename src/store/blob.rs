//! Blob storage for chute.
//!
//! This module provides physical storage for uploaded file content:
//! - UUID-based storage ids
//! - Directory sharding by first 2 characters of the id
//! - Save, load, delete and orphan-scan operations
//!
//! Blobs carry no metadata of their own; display names, sizes and MIME types
//! live in the in-memory registry. A blob on disk that no live group
//! references is an orphan and gets reclaimed by the sweep.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use uuid::Uuid;

use crate::{ChuteError, Result};

/// Longest extension carried over into a storage id.
const MAX_EXTENSION_LEN: usize = 16;

/// Blob store for uploaded file content.
///
/// Blobs are stored in a sharded directory structure:
/// ```text
/// {base_path}/
/// ├── ab/
/// │   └── ab12cd34-5678-90ab-cdef-123456789012.txt
/// ├── cd/
/// │   └── cd90ab12-3456-7890-abcd-ef1234567890.bin
/// └── ...
/// ```
#[derive(Debug, Clone)]
pub struct BlobStore {
    /// Base directory for blob storage.
    base_path: PathBuf,
}

impl BlobStore {
    /// Create a new BlobStore with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Save content under a fresh UUID-based storage id.
    ///
    /// # Arguments
    ///
    /// * `content` - The blob content to save
    /// * `display_name` - The client-supplied filename (used to extract an extension)
    ///
    /// # Returns
    ///
    /// The storage id (UUID.extension format). Storage ids appear verbatim in
    /// download URLs, so the extension is reduced to plain ASCII alphanumerics.
    pub fn save(&self, content: &[u8], display_name: &str) -> Result<String> {
        let storage_id = Self::new_storage_id(display_name);
        let file_path = self.blob_path(&storage_id);

        // Create the shard directory if it doesn't exist
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&file_path, content)?;

        Ok(storage_id)
    }

    /// Load blob content from storage.
    pub fn load(&self, storage_id: &str) -> Result<Vec<u8>> {
        let file_path = self.blob_path(storage_id);

        match fs::read(&file_path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ChuteError::NotFound(format!("blob {storage_id}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a blob from storage.
    ///
    /// # Returns
    ///
    /// `true` if the blob was deleted, `false` if it didn't exist
    pub fn delete(&self, storage_id: &str) -> Result<bool> {
        let file_path = self.blob_path(storage_id);

        match fs::remove_file(&file_path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a blob exists in storage.
    pub fn exists(&self, storage_id: &str) -> bool {
        self.blob_path(storage_id).exists()
    }

    /// Get the size of a stored blob.
    pub fn blob_size(&self, storage_id: &str) -> Result<u64> {
        let file_path = self.blob_path(storage_id);

        match fs::metadata(&file_path) {
            Ok(m) => Ok(m.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ChuteError::NotFound(format!("blob {storage_id}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List storage ids of blobs last modified before the cutoff.
    ///
    /// Walks every shard directory. Entries that cannot be inspected are
    /// skipped rather than failing the scan.
    pub fn scan_older_than(&self, cutoff: SystemTime) -> Result<Vec<String>> {
        let mut ids = Vec::new();

        for shard in fs::read_dir(&self.base_path)?.flatten() {
            let shard_path = shard.path();
            if !shard_path.is_dir() {
                continue;
            }
            let Ok(entries) = fs::read_dir(&shard_path) else {
                continue;
            };
            for entry in entries.flatten() {
                let Ok(meta) = entry.metadata() else {
                    continue;
                };
                if !meta.is_file() {
                    continue;
                }
                let Ok(modified) = meta.modified() else {
                    continue;
                };
                if modified < cutoff {
                    if let Some(name) = entry.file_name().to_str() {
                        ids.push(name.to_string());
                    }
                }
            }
        }

        Ok(ids)
    }

    /// Get the full file path for a storage id.
    ///
    /// The path is constructed as: {base_path}/{shard}/{storage_id}
    /// where shard is the first 2 characters of the id (UUID prefix).
    pub fn blob_path(&self, storage_id: &str) -> PathBuf {
        let shard = Self::shard_of(storage_id);
        self.base_path.join(shard).join(storage_id)
    }

    /// Get the shard directory name for a storage id.
    fn shard_of(storage_id: &str) -> &str {
        if storage_id.len() >= 2 {
            &storage_id[..2]
        } else {
            storage_id
        }
    }

    /// Generate a fresh UUID-based storage id, carrying over the extension of
    /// the display name when it is safe to embed in a URL path segment.
    fn new_storage_id(display_name: &str) -> String {
        let uuid = Uuid::new_v4();
        let ext = Self::safe_extension(display_name);
        format!("{uuid}.{ext}")
    }

    /// Extract a URL-safe file extension from a filename.
    ///
    /// Returns "bin" when the name has no extension, or when the extension is
    /// empty, too long, or contains anything beyond ASCII alphanumerics.
    fn safe_extension(filename: &str) -> &str {
        let ext = Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if ext.is_empty()
            || ext.len() > MAX_EXTENSION_LEN
            || !ext.chars().all(|c| c.is_ascii_alphanumeric())
        {
            "bin"
        } else {
            ext
        }
    }

    /// Clean up empty shard directories.
    ///
    /// This removes any empty subdirectories in the storage.
    pub fn cleanup_empty_dirs(&self) -> Result<usize> {
        let mut removed = 0;

        if let Ok(entries) = fs::read_dir(&self.base_path) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    if let Ok(dir_entries) = fs::read_dir(&path) {
                        if dir_entries.count() == 0 && fs::remove_dir(&path).is_ok() {
                            removed += 1;
                        }
                    }
                }
            }
        }

        Ok(removed)
    }
}

//! File group model for chute.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Handle to one uploaded file within a group.
///
/// The handle carries everything a listing needs; the content itself lives in
/// the blob store under `storage_id`.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Blob store locator, also the public download id for this file.
    pub storage_id: String,
    /// Client-supplied filename. Untrusted; only ever echoed back in
    /// listings and Content-Disposition headers, sanitized there.
    pub display_name: String,
    /// Actual number of bytes written to the blob store.
    pub size: u64,
    /// Client-declared MIME type, advisory only.
    pub content_type: String,
}

/// A group of files uploaded together, addressed by one share code.
#[derive(Debug, Clone)]
pub struct FileGroup {
    /// Files in upload order. Never empty for a registered group.
    pub files: Vec<StoredFile>,
    /// Deadline on the monotonic clock. The group is dead from this instant
    /// on, whether or not it is still in the registry map.
    pub expires_at: Instant,
    /// Wall-clock upload time, for listings and logs only.
    pub created_at: DateTime<Utc>,
}

impl FileGroup {
    /// Create a group expiring `ttl` from now.
    pub fn new(files: Vec<StoredFile>, ttl: Duration) -> Self {
        Self {
            files,
            expires_at: Instant::now() + ttl,
            created_at: Utc::now(),
        }
    }

    /// Whether the group has reached its deadline.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Find a file by its storage id.
    pub fn find_file(&self, storage_id: &str) -> Option<&StoredFile> {
        self.files.iter().find(|f| f.storage_id == storage_id)
    }

    /// Total size of the group in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

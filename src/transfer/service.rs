//! Transfer service for chute.
//!
//! High-level operations composing the group registry and the blob store:
//! - Store an uploaded batch and mint its share code
//! - Resolve a code to its group, expiring lazily
//! - Open one file of a group for download
//! - Sweep expired groups and orphaned blobs
//!
//! All blob I/O happens outside the registry lock. When an expired group is
//! evicted (lazily or by the sweep), the registry entry is gone before the
//! first blob is unlinked, so no lookup can observe a half-deleted group.

use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::store::BlobStore;
use crate::transfer::code::ShareCode;
use crate::transfer::group::{FileGroup, StoredFile};
use crate::transfer::registry::{GroupRegistry, Lookup};
use crate::{ChuteError, Result};

/// One file of an incoming upload, parsed off the wire.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Client-supplied filename.
    pub name: String,
    /// Client-declared MIME type.
    pub content_type: String,
    /// File content.
    pub content: Vec<u8>,
}

impl IncomingFile {
    /// Create a new incoming file.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            content,
        }
    }
}

/// Counters from one sweep pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Expired groups removed from the registry.
    pub groups_evicted: usize,
    /// Blobs of expired groups deleted from disk.
    pub blobs_deleted: usize,
    /// Blob deletions that failed and were left for the orphan pass.
    pub blobs_failed: usize,
    /// Unreferenced blobs past the grace age deleted from disk.
    pub orphans_deleted: usize,
}

impl SweepStats {
    /// Whether this pass removed anything at all.
    pub fn reclaimed_anything(&self) -> bool {
        self.groups_evicted > 0 || self.blobs_deleted > 0 || self.orphans_deleted > 0
    }
}

/// Service tying share codes, group metadata and blob content together.
pub struct TransferService {
    registry: GroupRegistry,
    blobs: BlobStore,
}

impl TransferService {
    /// Create a new TransferService.
    pub fn new(registry: GroupRegistry, blobs: BlobStore) -> Self {
        Self { registry, blobs }
    }

    /// Store an uploaded batch of files and mint its share code.
    ///
    /// Either every file is persisted and one code covers them all, or the
    /// call fails and no blob survives: on any mid-batch error the blobs
    /// already written for this request are deleted again before returning.
    ///
    /// # Returns
    /// The share code addressing the new group.
    pub fn store_group(&self, files: Vec<IncomingFile>) -> Result<ShareCode> {
        if files.is_empty() {
            return Err(ChuteError::Validation(
                "upload contains no files".to_string(),
            ));
        }

        let mut stored: Vec<StoredFile> = Vec::with_capacity(files.len());
        for file in files {
            let size = file.content.len() as u64;
            match self.blobs.save(&file.content, &file.name) {
                Ok(storage_id) => stored.push(StoredFile {
                    storage_id,
                    display_name: file.name,
                    size,
                    content_type: file.content_type,
                }),
                Err(e) => {
                    self.rollback_blobs(&stored);
                    return Err(e);
                }
            }
        }

        // The registry consumes the handles; keep the ids for rollback
        let rollback_ids: Vec<String> = stored.iter().map(|f| f.storage_id.clone()).collect();

        match self.registry.create(stored) {
            Ok((code, displaced)) => {
                if let Some(dead) = displaced {
                    debug!(code = %code, "new group displaced an expired one");
                    self.discard_group_blobs(&dead);
                }
                info!(
                    code = %code,
                    files = rollback_ids.len(),
                    "file group registered"
                );
                Ok(code)
            }
            Err(e) => {
                for id in &rollback_ids {
                    self.discard_blob(id);
                }
                Err(e)
            }
        }
    }

    /// Resolve a share code to its live group.
    ///
    /// Codes are matched case-insensitively. A group found past its deadline
    /// is evicted here, its blobs deleted, and the call reports
    /// [`ChuteError::Expired`]; any later call for the same code reports
    /// [`ChuteError::NotFound`].
    pub fn group_info(&self, code_input: &str) -> Result<FileGroup> {
        let Ok(code) = ShareCode::parse(code_input) else {
            // Malformed input can never name a group
            return Err(ChuteError::NotFound(format!("group {code_input}")));
        };

        match self.registry.lookup(&code) {
            Lookup::Live(group) => Ok(group),
            Lookup::Expired(group) => {
                debug!(code = %code, files = group.files.len(), "group expired on lookup");
                self.discard_group_blobs(&group);
                Err(ChuteError::Expired(format!("group {code}")))
            }
            Lookup::Missing => Err(ChuteError::NotFound(format!("group {code}"))),
        }
    }

    /// Open one file of a group for download.
    ///
    /// # Returns
    /// The file handle and the full blob content.
    pub fn open_file(&self, code_input: &str, storage_id: &str) -> Result<(StoredFile, Vec<u8>)> {
        let group = self.group_info(code_input)?;

        let Some(file) = group.find_file(storage_id) else {
            return Err(ChuteError::NotFound(format!("file {storage_id}")));
        };

        // A sweep may have won the race for the blob; its NotFound is final
        let content = self.blobs.load(&file.storage_id)?;
        Ok((file.clone(), content))
    }

    /// One full sweep pass: evict expired groups, delete their blobs, then
    /// reclaim unreferenced blobs older than `orphan_grace`.
    pub fn sweep(&self, orphan_grace: Duration) -> SweepStats {
        let mut stats = SweepStats::default();

        for (code, group) in self.registry.sweep_expired() {
            stats.groups_evicted += 1;
            debug!(code = %code, files = group.files.len(), "expired group evicted");
            for file in &group.files {
                match self.blobs.delete(&file.storage_id) {
                    Ok(true) => stats.blobs_deleted += 1,
                    Ok(false) => {}
                    Err(e) => {
                        warn!(
                            blob = %file.storage_id,
                            error = %e,
                            "failed to delete blob of expired group"
                        );
                        stats.blobs_failed += 1;
                    }
                }
            }
        }

        stats.orphans_deleted = self.sweep_orphans(orphan_grace);

        if stats.reclaimed_anything() {
            if let Err(e) = self.blobs.cleanup_empty_dirs() {
                warn!(error = %e, "failed to clean up empty shard directories");
            }
        }

        stats
    }

    /// Delete blobs on disk that no registered group references.
    ///
    /// Only blobs older than `grace` are touched, so an upload that has
    /// written its blobs but not yet registered its group is left alone.
    fn sweep_orphans(&self, grace: Duration) -> usize {
        let Some(cutoff) = SystemTime::now().checked_sub(grace) else {
            return 0;
        };

        let candidates = match self.blobs.scan_older_than(cutoff) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "orphan scan failed");
                return 0;
            }
        };
        if candidates.is_empty() {
            return 0;
        }

        let referenced = self.registry.referenced_storage_ids();
        let mut deleted = 0;
        for id in candidates {
            if referenced.contains(&id) {
                continue;
            }
            match self.blobs.delete(&id) {
                Ok(true) => {
                    debug!(blob = %id, "orphan blob reclaimed");
                    deleted += 1;
                }
                Ok(false) => {}
                Err(e) => warn!(blob = %id, error = %e, "failed to delete orphan blob"),
            }
        }
        deleted
    }

    /// Best-effort deletion of a group's blobs once its entry is gone.
    fn discard_group_blobs(&self, group: &FileGroup) {
        for file in &group.files {
            self.discard_blob(&file.storage_id);
        }
    }

    fn discard_blob(&self, storage_id: &str) {
        if let Err(e) = self.blobs.delete(storage_id) {
            warn!(blob = %storage_id, error = %e, "failed to delete blob");
        }
    }

    fn rollback_blobs(&self, stored: &[StoredFile]) {
        for file in stored {
            self.discard_blob(&file.storage_id);
        }
    }
}

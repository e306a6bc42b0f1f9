//! Response DTOs for Web API.
//!
//! Wire shapes are flat and fixed; external clients key on these exact field
//! names, so changes here are protocol changes.

use serde::Serialize;
use utoipa::ToSchema;

use crate::transfer::{FileGroup, StoredFile};

/// Response to a successful upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Share code addressing the uploaded group.
    #[schema(example = "AB3K")]
    pub code: String,
}

/// One file in a group listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileEntry {
    /// Download id of the file within its group.
    #[serde(rename = "filename")]
    #[schema(example = "7f9c1b2a-0d4e-4c5b-9a3f-2e8d6c1b0a9f.txt")]
    pub file_id: String,
    /// Filename as uploaded by the client.
    #[serde(rename = "originalname")]
    #[schema(example = "report.txt")]
    pub original_name: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type declared at upload time.
    #[serde(rename = "mimetype")]
    #[schema(example = "text/plain")]
    pub mime_type: String,
}

impl From<&StoredFile> for FileEntry {
    fn from(file: &StoredFile) -> Self {
        Self {
            file_id: file.storage_id.clone(),
            original_name: file.display_name.clone(),
            size: file.size,
            mime_type: file.content_type.clone(),
        }
    }
}

/// Listing of the files behind a share code.
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupInfoResponse {
    /// Files in upload order.
    pub files: Vec<FileEntry>,
}

impl From<&FileGroup> for GroupInfoResponse {
    fn from(group: &FileGroup) -> Self {
        Self {
            files: group.files.iter().map(FileEntry::from).collect(),
        }
    }
}

//! Disk-backed blob storage.

pub mod blob;

pub use blob::BlobStore;

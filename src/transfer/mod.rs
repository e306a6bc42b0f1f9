//! File transfer module for chute.
//!
//! This module implements the core of the relay:
//! - Share codes addressing uploaded file groups
//! - The in-memory registry with TTL-based expiry
//! - The transfer service tying registry and blob store together
//! - The background reaper

mod code;
mod group;
mod reaper;
mod registry;
mod service;

pub use code::{ShareCode, CODE_LEN};
pub use group::{FileGroup, StoredFile};
pub use reaper::Reaper;
pub use registry::{GroupRegistry, Lookup, MAX_CODE_ATTEMPTS};
pub use service::{IncomingFile, SweepStats, TransferService};

//! In-memory registry of share-code addressed file groups.
//!
//! The registry is the single source of truth for which codes are live. It
//! holds no file content; it maps codes to [`FileGroup`] metadata under one
//! coarse mutex. Every read-modify-write sequence (lazy expiry on lookup,
//! collision retry on create, the sweep) runs to completion inside that lock,
//! and blob I/O never does: expired groups are handed back to the caller,
//! which deletes their blobs after the lock is released. Entry removal
//! therefore always precedes blob deletion.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::transfer::code::ShareCode;
use crate::transfer::group::{FileGroup, StoredFile};
use crate::{ChuteError, Result};

/// Candidate codes drawn per create before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 16;

/// Outcome of a registry lookup.
#[derive(Debug)]
pub enum Lookup {
    /// The group exists and its deadline has not passed.
    Live(FileGroup),
    /// The group had passed its deadline; this lookup removed it. The caller
    /// now owns the group and is responsible for its blobs.
    Expired(FileGroup),
    /// No group registered under this code.
    Missing,
}

/// Registry of live file groups, keyed by share code.
#[derive(Debug)]
pub struct GroupRegistry {
    groups: Mutex<HashMap<ShareCode, FileGroup>>,
    ttl: Duration,
    max_live_groups: usize,
}

impl GroupRegistry {
    /// Create a registry whose groups live for `ttl` after registration.
    ///
    /// `max_live_groups` of zero means unbounded.
    pub fn new(ttl: Duration, max_live_groups: usize) -> Self {
        Self {
            groups: Mutex::new(HashMap::new()),
            ttl,
            max_live_groups,
        }
    }

    /// Register a new group and return its share code.
    ///
    /// Draws random codes until one is free, where "free" includes codes
    /// whose occupant has expired; such an occupant is displaced and returned
    /// alongside the new code so the caller can delete its blobs. Fails with
    /// [`ChuteError::CodesExhausted`] after [`MAX_CODE_ATTEMPTS`] collisions
    /// with live groups, and with [`ChuteError::AtCapacity`] when the
    /// configured live-group limit is already reached.
    pub fn create(&self, files: Vec<StoredFile>) -> Result<(ShareCode, Option<FileGroup>)> {
        if files.is_empty() {
            return Err(ChuteError::Validation(
                "file group must contain at least one file".to_string(),
            ));
        }

        let mut groups = self.groups.lock().unwrap();

        if self.max_live_groups > 0 {
            let live = groups.values().filter(|g| !g.is_expired()).count();
            if live >= self.max_live_groups {
                return Err(ChuteError::AtCapacity);
            }
        }

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = ShareCode::generate();
            if matches!(groups.get(&code), Some(existing) if !existing.is_expired()) {
                continue;
            }
            let displaced = groups.insert(code.clone(), FileGroup::new(files, self.ttl));
            return Ok((code, displaced));
        }

        Err(ChuteError::CodesExhausted)
    }

    /// Look up a group, lazily evicting it when its deadline has passed.
    ///
    /// A dead entry found here is removed in the same critical section, so a
    /// second lookup for the code reports [`Lookup::Missing`] even if the
    /// caller has not finished deleting blobs yet.
    pub fn lookup(&self, code: &ShareCode) -> Lookup {
        let mut groups = self.groups.lock().unwrap();

        let Some(group) = groups.get(code) else {
            return Lookup::Missing;
        };

        if group.is_expired() {
            match groups.remove(code) {
                Some(dead) => Lookup::Expired(dead),
                None => Lookup::Missing,
            }
        } else {
            Lookup::Live(group.clone())
        }
    }

    /// Remove a group unconditionally, returning it if present.
    pub fn evict(&self, code: &ShareCode) -> Option<FileGroup> {
        self.groups.lock().unwrap().remove(code)
    }

    /// Remove every group past its deadline and return them.
    ///
    /// A second call with no time elapsed returns nothing.
    pub fn sweep_expired(&self) -> Vec<(ShareCode, FileGroup)> {
        let mut groups = self.groups.lock().unwrap();

        let dead: Vec<ShareCode> = groups
            .iter()
            .filter(|(_, group)| group.is_expired())
            .map(|(code, _)| code.clone())
            .collect();

        dead.into_iter()
            .filter_map(|code| groups.remove(&code).map(|group| (code, group)))
            .collect()
    }

    /// Codes of every group still before its deadline.
    pub fn live_codes(&self) -> Vec<ShareCode> {
        let groups = self.groups.lock().unwrap();
        groups
            .iter()
            .filter(|(_, group)| !group.is_expired())
            .map(|(code, _)| code.clone())
            .collect()
    }

    /// Storage ids referenced by any registered group, expired or not.
    ///
    /// An entry owns its blobs until it is removed from the map, so the
    /// orphan sweep must not touch ids returned here.
    pub fn referenced_storage_ids(&self) -> HashSet<String> {
        let groups = self.groups.lock().unwrap();
        groups
            .values()
            .flat_map(|group| group.files.iter().map(|f| f.storage_id.clone()))
            .collect()
    }

    /// Number of registered groups, including not-yet-reaped dead ones.
    pub fn len(&self) -> usize {
        self.groups.lock().unwrap().len()
    }

    /// Whether the registry holds no groups at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

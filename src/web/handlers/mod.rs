//! API handlers for the Web API.

use std::sync::Arc;

use crate::transfer::TransferService;

pub mod transfer;

pub use transfer::*;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Transfer service (group registry + blob store).
    pub transfers: Arc<TransferService>,
    /// Maximum upload size per request in bytes.
    pub max_upload_size: usize,
}

impl AppState {
    /// Create a new application state.
    pub fn new(transfers: Arc<TransferService>, max_upload_size: usize) -> Self {
        Self {
            transfers,
            max_upload_size,
        }
    }
}

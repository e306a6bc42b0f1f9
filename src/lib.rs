//! chute - ephemeral file drop
//!
//! Upload files over HTTP, hand out a short share code, and let the files
//! vanish once the TTL runs out.

pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod transfer;
pub mod web;

pub use config::Config;
pub use error::{ChuteError, Result};
pub use store::BlobStore;
pub use transfer::{FileGroup, GroupRegistry, Reaper, ShareCode, StoredFile, TransferService};
pub use web::WebServer;

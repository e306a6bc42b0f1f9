//! Web API module for chute.
//!
//! This module provides the REST API: multipart upload, group listing by
//! share code, and per-file download.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;

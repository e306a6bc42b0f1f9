//! Background expiry reaper.
//!
//! Groups past their deadline are already invisible to lookups; the reaper
//! exists so their registry entries and blobs are reclaimed even when nobody
//! ever asks for the code again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::transfer::service::TransferService;

/// Periodic sweep task over a [`TransferService`].
pub struct Reaper {
    service: Arc<TransferService>,
    interval: Duration,
    orphan_grace: Duration,
}

impl Reaper {
    /// Create a reaper sweeping every `interval`.
    pub fn new(service: Arc<TransferService>, interval: Duration, orphan_grace: Duration) -> Self {
        Self {
            service,
            interval,
            orphan_grace,
        }
    }

    /// Spawn the sweep loop onto the runtime.
    ///
    /// The loop never exits on its own; drop the handle to let it run for
    /// the life of the process, or abort it in tests.
    pub fn spawn(self) -> JoinHandle<()> {
        let Reaper {
            service,
            interval,
            orphan_grace,
        } = self;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            // Skip the first immediate tick
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let stats = service.sweep(orphan_grace);
                if stats.reclaimed_anything() {
                    info!(
                        groups = stats.groups_evicted,
                        blobs = stats.blobs_deleted,
                        failed = stats.blobs_failed,
                        orphans = stats.orphans_deleted,
                        "sweep reclaimed expired transfers"
                    );
                } else {
                    debug!("sweep found nothing to reclaim");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BlobStore;
    use crate::transfer::registry::GroupRegistry;
    use crate::transfer::service::IncomingFile;
    use crate::ChuteError;
    use tempfile::TempDir;

    fn setup(ttl: Duration) -> (TempDir, BlobStore, Arc<TransferService>) {
        let temp_dir = TempDir::new().unwrap();
        let blobs = BlobStore::new(temp_dir.path()).unwrap();
        let registry = GroupRegistry::new(ttl, 0);
        let service = Arc::new(TransferService::new(registry, blobs.clone()));
        (temp_dir, blobs, service)
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_sweeps_on_schedule() {
        let (_dir, blobs, service) = setup(Duration::from_secs(5));

        let code = service
            .store_group(vec![IncomingFile::new("a.txt", "text/plain", b"x".to_vec())])
            .unwrap();
        let id = service.group_info(code.as_str()).unwrap().files[0]
            .storage_id
            .clone();

        let handle = Reaper::new(
            Arc::clone(&service),
            Duration::from_secs(60),
            Duration::from_secs(3600),
        )
        .spawn();

        // Let the task start up and swallow the immediate first tick
        tokio::task::yield_now().await;

        // The group dies at t+5s but the first sweep is at t+60s
        tokio::time::advance(Duration::from_secs(30)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert!(blobs.exists(&id));

        tokio::time::advance(Duration::from_secs(31)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert!(!blobs.exists(&id));
        assert!(matches!(
            service.group_info(code.as_str()),
            Err(ChuteError::NotFound(_))
        ));

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_leaves_live_groups_alone() {
        let (_dir, blobs, service) = setup(Duration::from_secs(600));

        let code = service
            .store_group(vec![IncomingFile::new("a.txt", "text/plain", b"x".to_vec())])
            .unwrap();
        let id = service.group_info(code.as_str()).unwrap().files[0]
            .storage_id
            .clone();

        let handle = Reaper::new(
            Arc::clone(&service),
            Duration::from_secs(60),
            Duration::from_secs(3600),
        )
        .spawn();

        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(61)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert!(blobs.exists(&id));
        assert!(service.group_info(code.as_str()).is_ok());

        handle.abort();
    }
}

//! Web server for chute.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::{Config, ServerConfig};
use crate::error::ChuteError;
use crate::store::BlobStore;
use crate::transfer::{GroupRegistry, Reaper, TransferService};

use super::handlers::AppState;
use super::router::{create_health_router, create_router, create_swagger_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Server configuration.
    server_config: ServerConfig,
    /// How often the reaper sweeps expired groups.
    reap_interval: Duration,
    /// Minimum age before an unreferenced blob is reclaimed.
    orphan_grace: Duration,
}

impl WebServer {
    /// Create a new web server from the application configuration.
    pub fn new(config: &Config) -> crate::error::Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|_| {
                ChuteError::Config(format!(
                    "invalid web server address {}:{}",
                    config.server.host, config.server.port
                ))
            })?;

        let blobs = BlobStore::new(&config.storage.path)?;
        tracing::info!("Blob store initialized at: {}", config.storage.path);

        let registry = GroupRegistry::new(
            Duration::from_secs(config.transfer.ttl_secs),
            config.transfer.max_live_groups,
        );
        let transfers = Arc::new(TransferService::new(registry, blobs));

        let app_state = AppState::new(transfers, config.max_upload_size_bytes());

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            server_config: config.server.clone(),
            reap_interval: Duration::from_secs(config.transfer.reap_interval_secs),
            orphan_grace: Duration::from_secs(config.transfer.orphan_grace_secs),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Assemble the full router: API, health check, Swagger UI.
    fn build_router(&self) -> Router {
        create_router(self.app_state.clone(), &self.server_config.cors_origins)
            .merge(create_health_router())
            .merge(create_swagger_router())
            .layer(CompressionLayer::new())
    }

    /// Start the expiry reaper background task.
    fn start_reaper(&self) {
        let reaper = Reaper::new(
            self.app_state.transfers.clone(),
            self.reap_interval,
            self.orphan_grace,
        );
        reaper.spawn();
        tracing::info!(
            "Expiry reaper started (runs every {}s)",
            self.reap_interval.as_secs()
        );
    }

    /// Run the web server.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let router = self.build_router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        // Start the reaper only after a successful bind
        self.start_reaper();

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router).await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr, std::io::Error> {
        let router = self.build_router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        self.start_reaper();

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0; // Use random port
        config.storage.path = dir.path().join("blobs").to_string_lossy().into_owned();
        config
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(&dir);

        let server = WebServer::new(&config).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_web_server_rejects_bad_address() {
        let dir = TempDir::new().unwrap();
        let mut config = create_test_config(&dir);
        config.server.host = "not a host".to_string();

        assert!(WebServer::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(&dir);

        let server = WebServer::new(&config).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        // Test health endpoint
        let client = reqwest::Client::new();
        let resp = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();

        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "OK");
    }

    #[tokio::test]
    async fn test_web_server_banner() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(&dir);

        let server = WebServer::new(&config).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        let client = reqwest::Client::new();
        let resp = client
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap();

        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "chute is running");
    }
}

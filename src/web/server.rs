//! HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::Config;
use crate::db::RefreshTokenRepository;
use crate::speech::{ObjectStorage, SpeechSynthesizer};
use crate::{Database, Result, SkratimeError};

use super::handlers::AppState;
use super::router::create_router;

/// Interval of the refresh token cleanup task.
const TOKEN_CLEANUP_INTERVAL_SECS: u64 = 3600;

/// API server.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a server for the configured address.
    pub fn new(
        config: &Config,
        db: Database,
        storage: ObjectStorage,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| SkratimeError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(db, config, storage, synthesizer)),
            cors_origins: config.web.cors_origins.clone(),
        })
    }

    /// Configured listen address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Application router with compression applied.
    pub fn router(&self) -> axum::Router {
        create_router(self.app_state.clone(), &self.cors_origins).layer(CompressionLayer::new())
    }

    /// Remove expired and revoked refresh tokens every hour.
    fn start_token_cleanup_task(db: Database) {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(TOKEN_CLEANUP_INTERVAL_SECS));
            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                match RefreshTokenRepository::new(db.pool()).cleanup_expired().await {
                    Ok(0) => tracing::debug!("No expired refresh tokens to clean up"),
                    Ok(count) => tracing::info!(
                        deleted_count = count,
                        "Cleaned up expired/revoked refresh tokens"
                    ),
                    Err(e) => tracing::warn!(error = %e, "Failed to cleanup refresh tokens"),
                }
            }
        });
    }

    async fn bind(self) -> std::io::Result<(TcpListener, axum::Router)> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;

        Self::start_token_cleanup_task(self.app_state.db.clone());
        tracing::info!("Token cleanup task started (runs every hour)");
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        Ok((listener, router))
    }

    /// Run the server until it fails.
    pub async fn run(self) -> std::io::Result<()> {
        let (listener, router) = self.bind().await?;
        axum::serve(listener, router).await
    }

    /// Run the server in the background and return the bound address.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let (listener, router) = self.bind().await?;
        let local_addr = listener.local_addr()?;

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
    use crate::speech::HttpSpeechSynthesizer;
    use tempfile::TempDir;

    async fn server(dir: &TempDir) -> WebServer {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.web.jwt_secret = "test-secret".to_string();

        let db = Database::open_in_memory().await.unwrap();
        let storage =
            ObjectStorage::new(dir.path(), "media-secret", "http://localhost", 60).unwrap();
        let synthesizer = Arc::new(HttpSpeechSynthesizer::new(&config.speech).unwrap());
        WebServer::new(&config, db, storage, synthesizer).unwrap()
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir).await;
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let dir = TempDir::new().unwrap();
        let addr = server(&dir).await.run_with_addr().await.unwrap();

        let resp = reqwest::Client::new()
            .get(format!("http://{addr}/health"))
            .send()
            .await
            .unwrap();

        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "OK");
    }
}

//! Server management - spawning and health checking the fake backend

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use seatwise_cli::ApiClient;
use seatwise_common::ClientConfig;

use crate::error::{E2eError, E2eResult};
use crate::fake_api::FakeApi;

/// Handle to a running fake backend
pub struct ServerHandle {
    api: FakeApi,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
    pub base_url: String,
    pub port: u16,
}

impl ServerHandle {
    /// Serve the fake backend on the current tokio runtime
    pub async fn spawn(config: ServerConfig) -> E2eResult<Self> {
        let listener = TcpListener::bind(("127.0.0.1", config.port.unwrap_or(0)))
            .await
            .map_err(|e| E2eError::ServerStartup(format!("Failed to bind: {}", e)))?;
        let port = listener.local_addr()?.port();
        let base_url = format!("http://127.0.0.1:{}", port);

        info!("Spawning fake backend on port {}", port);

        let mut api = if config.seed_courses {
            FakeApi::seeded().await
        } else {
            FakeApi::new()
        };
        if let Some(latency) = config.latency {
            api = api.with_latency(latency);
        }

        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();
        let router = api.router();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await;
            if let Err(e) = result {
                warn!("Fake backend exited with error: {}", e);
            }
        });

        let handle = ServerHandle {
            api,
            shutdown,
            task: Some(task),
            base_url: base_url.clone(),
            port,
        };

        handle.wait_for_healthy(config.startup_timeout).await?;

        info!("Server is healthy at {}", base_url);
        Ok(handle)
    }

    /// Wait for the server to respond to health checks
    async fn wait_for_healthy(&self, timeout_duration: Duration) -> E2eResult<()> {
        let health_url = format!("{}/health", self.base_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            match client.get(&health_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Health check returned {}", resp.status());
                }
                Err(e) => {
                    // Connection refused is expected while server is starting
                    if !e.is_connect() {
                        warn!("Health check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(50)).await;
        }

        Err(E2eError::ServerHealthCheck(attempts))
    }

    /// Get the base URL for this server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Server-side view of the data, for assertions that bypass the client
    pub fn api(&self) -> &FakeApi {
        &self.api
    }

    /// An API client pointed at this server
    pub fn client(&self) -> E2eResult<ApiClient> {
        Ok(ApiClient::new(ClientConfig::new(&self.base_url)?)?)
    }

    /// Stop the server
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            info!("Stopping fake backend on port {}", self.port);
            self.shutdown.cancel();
            task.abort();
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Configuration for spawning a server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on (None = any free port)
    pub port: Option<u16>,

    /// Timeout for server startup
    pub startup_timeout: Duration,

    /// Start with the standard four courses
    pub seed_courses: bool,

    /// Delay every API response by this much
    pub latency: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: None,
            startup_timeout: Duration::from_secs(10),
            seed_courses: true,
            latency: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_picks_free_port() {
        let first = ServerHandle::spawn(ServerConfig::default()).await.unwrap();
        let second = ServerHandle::spawn(ServerConfig::default()).await.unwrap();

        assert!(first.port > 0);
        assert_ne!(first.port, second.port);
        assert!(first.base_url().starts_with("http://127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_seeded_courses() {
        let server = ServerHandle::spawn(ServerConfig::default()).await.unwrap();
        let bar = server.api().course_by_name("Bar #1").await.unwrap();
        assert_eq!(bar.capacity, 1);
        assert!(!bar.is_occupied());
    }
}

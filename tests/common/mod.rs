#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use profile_history::testing::{test_app, MemoryVersionStore, StaticVerifier};
use reqwest::StatusCode;

pub use profile_history::testing::{ADMIN_TOKEN, ALICE_TOKEN, BOB_TOKEN, TEST_ORIGIN};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryVersionStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Serve the app in-process over a fresh in-memory store
    pub async fn spawn(verifier: StaticVerifier) -> Result<Self> {
        Self::spawn_with_store(Arc::new(MemoryVersionStore::new()), verifier).await
    }

    pub async fn spawn_with_store(store: Arc<MemoryVersionStore>, verifier: StaticVerifier) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        let app = test_app(store.clone(), verifier);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            port,
            base_url,
            store,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// Absolute URL of an API path, e.g. `api("/profile/alice")`
    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self.client.get(self.api(path)).bearer_auth(token).send().await?)
    }

    pub async fn post(&self, path: &str, token: &str, body: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.api(path))
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await?)
    }
}

/// Server with `alice`, `bob` and the admin `root`
pub async fn standard_server() -> Result<TestServer> {
    TestServer::spawn(StaticVerifier::standard()).await
}

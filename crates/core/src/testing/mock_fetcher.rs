//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::source::{FetchError, Fetcher};

/// Mock implementation of the Fetcher trait.
///
/// Serves bytes from an in-memory URL map; unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct MockFetcher {
    /// Bodies by URL.
    bodies: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    /// URLs that fail with a transport error.
    broken: Arc<RwLock<HashMap<String, String>>>,
    /// Requested URLs, in order.
    requests: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    /// Create a new mock fetcher that serves nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `url`.
    pub async fn serve(&self, url: &str, body: Vec<u8>) {
        self.bodies.write().await.insert(url.to_string(), body);
    }

    /// Make `url` fail as if the connection broke.
    pub async fn break_url(&self, url: &str, reason: &str) {
        self.broken
            .write()
            .await
            .insert(url.to_string(), reason.to_string());
    }

    /// Get all requested URLs.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        self.requests.write().await.push(url.to_string());

        if let Some(reason) = self.broken.read().await.get(url) {
            return Err(FetchError::Transport {
                url: url.to_string(),
                reason: reason.clone(),
            });
        }

        let body = self.bodies.read().await.get(url).cloned();
        match body {
            Some(body) => {
                tokio::fs::write(dest, &body).await?;
                Ok(body.len() as u64)
            }
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

//! Remote byte fetching.

use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::JobError;

/// Errors from fetching a remote source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("GET {url} timed out")]
    Timeout { url: String },

    #[error("GET {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// Writing the downloaded bytes failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FetchError> for JobError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Io(e) => JobError::storage("failed to write fetched source", e),
            other => JobError::source_unavailable(other.to_string()),
        }
    }
}

/// Downloads a URL into a local file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Streams the body of `url` into `dest` and returns the byte count.
    ///
    /// Only 2xx responses are accepted.
    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}

/// `reqwest`-backed fetcher that streams bodies straight to disk.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(concat!("clipforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    fn classify(url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Self::classify(url, e))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(url = %url, bytes = written, "Fetched source");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(timeout_secs: u64) -> HttpFetcher {
        HttpFetcher::new(&UpstreamConfig {
            base_url: "http://unused".to_string(),
            fetch_timeout_secs: timeout_secs,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_streams_body_to_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("clip.mp4");
        let url = format!("{}/media/clip.mp4", server.uri());
        let written = fetcher(5).fetch_to_file(&url, &dest).await.unwrap();

        assert_eq!(written, 4096);
        assert_eq!(std::fs::read(&dest).unwrap().len(), 4096);
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let url = format!("{}/missing", server.uri());
        let err = fetcher(5)
            .fetch_to_file(&url, &tmp.path().join("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        let job_err: JobError = err.into();
        assert!(matches!(job_err, JobError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let url = format!("{}/slow", server.uri());
        let err = fetcher(1)
            .fetch_to_file(&url, &tmp.path().join("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let tmp = TempDir::new().unwrap();
        let err = fetcher(2)
            .fetch_to_file("http://127.0.0.1:1/nothing", &tmp.path().join("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}

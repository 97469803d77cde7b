//! Turns source descriptors into local files.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use tracing::{debug, warn};

use super::fetcher::Fetcher;
use crate::config::UpstreamConfig;
use crate::error::JobError;
use crate::job::Artifact;
use crate::metrics::SOURCE_FETCHES;

/// Where an input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    /// Any http(s) URL.
    RemoteUrl(String),
    /// Reference to a video rendered by the upstream service.
    UpstreamJob(String),
    /// Base64 payload carried in the request.
    Inline(String),
}

impl SourceDescriptor {
    /// Builds a descriptor from the optional request fields for one input.
    ///
    /// Exactly one field must be non-blank.
    pub fn from_fields(
        what: &str,
        url: Option<&str>,
        upstream: Option<&str>,
        inline: Option<&str>,
    ) -> Result<Self, JobError> {
        fn present(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|s| !s.is_empty())
        }

        let candidates = [
            present(url).map(|s| Self::RemoteUrl(s.to_string())),
            present(upstream).map(|s| Self::UpstreamJob(s.to_string())),
            present(inline).map(|s| Self::Inline(s.to_string())),
        ];

        let mut found = candidates.into_iter().flatten();
        match (found.next(), found.next()) {
            (Some(descriptor), None) => Ok(descriptor),
            (None, _) => Err(JobError::missing_source(format!(
                "{} source required (url, job id or base64)",
                what
            ))),
            (Some(_), Some(_)) => Err(JobError::invalid(format!(
                "provide exactly one {} source, got several",
                what
            ))),
        }
    }

    /// Optional variant of [`from_fields`](Self::from_fields): no field present is `None`.
    pub fn optional(
        what: &str,
        url: Option<&str>,
        upstream: Option<&str>,
        inline: Option<&str>,
    ) -> Result<Option<Self>, JobError> {
        match Self::from_fields(what, url, upstream, inline) {
            Ok(descriptor) => Ok(Some(descriptor)),
            Err(JobError::MissingSource(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RemoteUrl(_) => "url",
            Self::UpstreamJob(_) => "upstream",
            Self::Inline(_) => "inline",
        }
    }
}

/// Materializes sources inside a job's staging area.
#[derive(Clone)]
pub struct SourceResolver {
    fetcher: Arc<dyn Fetcher>,
    upstream_base: String,
}

impl SourceResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &UpstreamConfig) -> Self {
        Self {
            fetcher,
            upstream_base: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn upstream_base(&self) -> &str {
        &self.upstream_base
    }

    /// URL the upstream renderer serves a reference at.
    pub fn upstream_url(&self, reference: &str) -> String {
        format!(
            "{}/video/{}",
            self.upstream_base,
            urlencoding::encode(reference)
        )
    }

    /// Writes the source bytes to `destination`.
    ///
    /// Resolving the same descriptor twice overwrites the same path.
    pub async fn resolve(
        &self,
        descriptor: &SourceDescriptor,
        destination: Artifact,
    ) -> Result<Artifact, JobError> {
        let result = match descriptor {
            SourceDescriptor::RemoteUrl(url) => self.fetch(url, &destination).await,
            SourceDescriptor::UpstreamJob(reference) => {
                self.fetch(&self.upstream_url(reference), &destination).await
            }
            SourceDescriptor::Inline(payload) => self.write_inline(payload, &destination).await,
        };

        match result {
            Ok(bytes) => {
                SOURCE_FETCHES
                    .with_label_values(&[descriptor.kind(), "success"])
                    .inc();
                debug!(kind = descriptor.kind(), artifact = %destination.name, bytes, "Resolved source");
                Ok(destination)
            }
            Err(e) => {
                SOURCE_FETCHES
                    .with_label_values(&[descriptor.kind(), e.kind().as_str()])
                    .inc();
                warn!(kind = descriptor.kind(), artifact = %destination.name, error = %e, "Source resolution failed");
                Err(e)
            }
        }
    }

    /// Writes literal text (subtitles) to `destination`.
    pub async fn write_text(&self, text: &str, destination: Artifact) -> Result<Artifact, JobError> {
        tokio::fs::write(&destination.path, text.as_bytes())
            .await
            .map_err(|e| JobError::storage("failed to write text source", e))?;
        Ok(destination)
    }

    async fn write_inline(&self, payload: &str, destination: &Artifact) -> Result<u64, JobError> {
        let bytes = decode_inline(payload)?;
        tokio::fs::write(&destination.path, &bytes)
            .await
            .map_err(|e| JobError::storage("failed to write inline source", e))?;
        Ok(bytes.len() as u64)
    }

    async fn fetch(&self, url: &str, destination: &Artifact) -> Result<u64, JobError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(JobError::source_unavailable(format!(
                "unsupported URL scheme: {}",
                url
            )));
        }
        match self.fetcher.fetch_to_file(url, &destination.path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                let _ = tokio::fs::remove_file(&destination.path).await;
                Err(e.into())
            }
        }
    }
}

/// Decodes a base64 payload, tolerating whitespace and a data-URL prefix.
fn decode_inline(payload: &str) -> Result<Vec<u8>, JobError> {
    let payload = payload.trim();
    let payload = match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| JobError::source_unavailable(format!("invalid base64 payload: {}", e)))?;
    if bytes.is_empty() {
        return Err(JobError::source_unavailable("inline payload is empty"));
    }
    Ok(bytes)
}

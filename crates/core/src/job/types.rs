//! Job identity and artifact types.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::JobError;

static SAFE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,128}$").unwrap());

/// Checks that `name` is a single safe path component.
pub(crate) fn validate_component(what: &str, name: &str) -> Result<(), JobError> {
    if !SAFE_NAME.is_match(name) || name.contains("..") {
        return Err(JobError::invalid(format!("invalid {} '{}'", what, name)));
    }
    Ok(())
}

/// Opaque job token: 8 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Self(uuid[..8].to_string())
    }

    /// Parses an id received from a client.
    pub fn parse(value: &str) -> Result<Self, JobError> {
        validate_component("job id", value)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What an artifact is within its job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "role", content = "index")]
pub enum ArtifactRole {
    InputVideo,
    InputAudio,
    InputMusic,
    InputSubtitles,
    /// The i-th clip of a concatenation.
    Clip(usize),
    /// Output of pipeline stage n.
    Intermediate(u8),
    Final,
}

/// A file produced or materialized inside a staging area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub path: PathBuf,
    pub role: ArtifactRole,
}

/// MIME type for an artifact, from its extension.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "aac" => "audio/aac",
        "wav" => "audio/wav",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "srt" => "application/x-subrip",
        _ => "application/octet-stream",
    }
}

//! Per-job staging directory.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::types::{Artifact, ArtifactRole, JobId};
use crate::error::JobError;

/// The directory owned by a single job.
///
/// Every input, intermediate and final artifact of the job lives directly
/// inside it, under a deterministic name.
#[derive(Debug, Clone)]
pub struct StagingArea {
    id: JobId,
    dir: PathBuf,
}

impl StagingArea {
    pub(crate) fn new(id: JobId, dir: PathBuf) -> Self {
        Self { id, dir }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// An artifact slot named `name` inside this area. Nothing is written.
    pub fn artifact(&self, name: impl Into<String>, role: ArtifactRole) -> Artifact {
        let name = name.into();
        Artifact {
            path: self.dir.join(&name),
            name,
            role,
        }
    }

    /// Numbered pipeline stage output such as `03_with_music.mp4`.
    pub fn intermediate(&self, index: u8, label: &str) -> Artifact {
        self.artifact(
            format!("{:02}_{}.mp4", index, label),
            ArtifactRole::Intermediate(index),
        )
    }

    /// Job result named `<prefix>_<job_id>.<ext>`.
    pub fn result(&self, prefix: &str, ext: &str) -> Artifact {
        self.artifact(
            format!("{}_{}.{}", prefix, self.id, ext),
            ArtifactRole::Final,
        )
    }

    /// Writes raw bytes into an artifact slot.
    pub async fn write(&self, artifact: &Artifact, bytes: &[u8]) -> Result<u64, JobError> {
        tokio::fs::write(&artifact.path, bytes)
            .await
            .map_err(|e| JobError::storage(&format!("failed to write {}", artifact.name), e))?;
        Ok(bytes.len() as u64)
    }

    /// Copies `current` to `final_<job_id>.mp4`.
    pub async fn finalize(&self, current: &Artifact) -> Result<Artifact, JobError> {
        let target = self.result("final", "mp4");
        tokio::fs::copy(&current.path, &target.path)
            .await
            .map_err(|e| JobError::storage("failed to copy final artifact", e))?;
        debug!(job_id = %self.id, from = %current.name, to = %target.name, "Finalized artifact");
        Ok(target)
    }

    /// Size of a produced artifact in bytes.
    pub async fn size_of(&self, artifact: &Artifact) -> Result<u64, JobError> {
        let meta = tokio::fs::metadata(&artifact.path)
            .await
            .map_err(|e| JobError::storage(&format!("failed to stat {}", artifact.name), e))?;
        Ok(meta.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn area(tmp: &TempDir) -> StagingArea {
        StagingArea::new(JobId::parse("abc12345").unwrap(), tmp.path().to_path_buf())
    }

    #[test]
    fn test_artifact_naming() {
        let tmp = TempDir::new().unwrap();
        let area = area(&tmp);

        let merged = area.intermediate(2, "merged");
        assert_eq!(merged.name, "02_merged.mp4");
        assert_eq!(merged.role, ArtifactRole::Intermediate(2));
        assert!(merged.path.starts_with(tmp.path()));

        let result = area.result("thumbnail", "jpg");
        assert_eq!(result.name, "thumbnail_abc12345.jpg");
        assert_eq!(result.role, ArtifactRole::Final);
    }

    #[tokio::test]
    async fn test_finalize_copies_current() {
        let tmp = TempDir::new().unwrap();
        let area = area(&tmp);
        let current = area.intermediate(5, "resized");
        area.write(&current, b"frames").await.unwrap();

        let fin = area.finalize(&current).await.unwrap();
        assert_eq!(fin.name, "final_abc12345.mp4");
        assert_eq!(tokio::fs::read(&fin.path).await.unwrap(), b"frames");
        // The source of the copy is left in place
        assert!(current.path.exists());
        assert_eq!(area.size_of(&fin).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_finalize_missing_source_is_storage_error() {
        let tmp = TempDir::new().unwrap();
        let area = area(&tmp);
        let ghost = area.intermediate(1, "video");
        let err = area.finalize(&ghost).await.unwrap_err();
        assert!(matches!(err, JobError::StorageUnavailable(_)));
    }
}

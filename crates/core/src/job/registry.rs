//! Job registry: maps job ids to staging directories.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::staging::StagingArea;
use super::types::{validate_component, JobId};
use crate::config::StagingConfig;
use crate::error::JobError;

const CREATE_ATTEMPTS: usize = 5;

/// Owns the staging root and every job directory under it.
///
/// The filesystem is the only state: a job exists exactly when
/// `<root>/<job_id>` exists.
#[derive(Debug, Clone)]
pub struct JobRegistry {
    root: PathBuf,
}

impl JobRegistry {
    pub fn new(config: &StagingConfig) -> Self {
        Self {
            root: config.root.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates a fresh job with its own empty directory.
    pub async fn create(&self) -> Result<StagingArea, JobError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| JobError::storage("failed to create staging root", e))?;

        for _ in 0..CREATE_ATTEMPTS {
            let id = JobId::generate();
            let dir = self.root.join(id.as_str());
            // create_dir fails on an existing directory, so ids are never reused
            match tokio::fs::create_dir(&dir).await {
                Ok(()) => {
                    debug!(job_id = %id, dir = %dir.display(), "Created job");
                    return Ok(StagingArea::new(id, dir));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    warn!(job_id = %id, "Job id collision, retrying");
                }
                Err(e) => return Err(JobError::storage("failed to create job directory", e)),
            }
        }

        Err(JobError::StorageUnavailable(format!(
            "could not allocate a job directory after {} attempts",
            CREATE_ATTEMPTS
        )))
    }

    /// Opens an existing job.
    pub async fn open(&self, job_id: &str) -> Result<StagingArea, JobError> {
        let id = JobId::parse(job_id).map_err(|_| JobError::not_found(format!("job {}", job_id)))?;
        let dir = self.root.join(id.as_str());
        if !tokio::fs::metadata(&dir).await.is_ok_and(|m| m.is_dir()) {
            return Err(JobError::not_found(format!("job {}", job_id)));
        }
        Ok(StagingArea::new(id, dir))
    }

    /// Path of a named artifact inside a job.
    pub async fn resolve_artifact(&self, job_id: &str, name: &str) -> Result<PathBuf, JobError> {
        let area = self.open(job_id).await?;
        validate_component("artifact name", name)
            .map_err(|_| JobError::not_found(format!("file {}", name)))?;
        let path = area.dir().join(name);
        if !tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            return Err(JobError::not_found(format!("file {}", name)));
        }
        Ok(path)
    }

    /// Recursively removes one job.
    pub async fn dispose(&self, job_id: &str) -> Result<(), JobError> {
        let area = self.open(job_id).await?;
        tokio::fs::remove_dir_all(area.dir())
            .await
            .map_err(|e| JobError::storage("failed to remove job directory", e))?;
        info!(job_id = %area.id(), "Disposed job");
        Ok(())
    }

    /// Removes every job directory and returns how many were removed.
    pub async fn dispose_all(&self) -> Result<usize, JobError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(JobError::storage("failed to list staging root", e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| JobError::storage("failed to list staging root", e))?
        {
            let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
            if !is_dir {
                continue;
            }
            match tokio::fs::remove_dir_all(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %entry.path().display(), error = %e, "Failed to remove job"),
            }
        }

        info!(count = removed, "Disposed all jobs");
        Ok(removed)
    }
}

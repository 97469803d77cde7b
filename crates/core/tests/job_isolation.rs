//! Job registry integration tests.
//!
//! Jobs share nothing but the staging root: concurrent creates get distinct
//! directories, and disposing one job never touches another.

use std::collections::HashSet;

use tempfile::TempDir;

use clipforge_core::{config::StagingConfig, ArtifactRole, JobError, JobRegistry};

fn registry(tmp: &TempDir) -> JobRegistry {
    JobRegistry::new(&StagingConfig {
        root: tmp.path().join("staging"),
    })
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_directories() {
    let tmp = TempDir::new().unwrap();
    let registry = registry(&tmp);

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.create().await })
        })
        .collect();

    let mut dirs = HashSet::new();
    for handle in handles {
        let area = handle.await.unwrap().unwrap();
        assert!(area.dir().is_dir());
        assert!(dirs.insert(area.dir().to_path_buf()));
    }
    assert_eq!(dirs.len(), 32);
}

#[tokio::test]
async fn test_dispose_one_keeps_the_other() {
    let tmp = TempDir::new().unwrap();
    let registry = registry(&tmp);

    let a = registry.create().await.unwrap();
    let b = registry.create().await.unwrap();
    let result_a = a.result("merged", "mp4");
    let result_b = b.result("merged", "mp4");
    a.write(&result_a, b"a").await.unwrap();
    b.write(&result_b, b"b").await.unwrap();

    registry.dispose(a.id().as_str()).await.unwrap();

    assert!(!a.dir().exists());
    let path = registry
        .resolve_artifact(b.id().as_str(), &result_b.name)
        .await
        .unwrap();
    assert_eq!(std::fs::read(path).unwrap(), b"b");
    assert!(matches!(
        registry.resolve_artifact(a.id().as_str(), &result_a.name).await,
        Err(JobError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_retrieval_never_leaves_the_job() {
    let tmp = TempDir::new().unwrap();
    let registry = registry(&tmp);
    let a = registry.create().await.unwrap();
    let b = registry.create().await.unwrap();
    let secret = b.artifact("secret.mp4", ArtifactRole::Final);
    b.write(&secret, b"x").await.unwrap();

    let sibling = format!("../{}/secret.mp4", b.id());
    for name in [
        "../secret.mp4",
        sibling.as_str(),
        "..",
        "",
        "a/b.mp4",
    ] {
        assert!(
            matches!(
                registry.resolve_artifact(a.id().as_str(), name).await,
                Err(JobError::NotFound(_))
            ),
            "{} should not resolve",
            name
        );
    }
}

#[tokio::test]
async fn test_dispose_all_counts_jobs() {
    let tmp = TempDir::new().unwrap();
    let registry = registry(&tmp);
    assert_eq!(registry.dispose_all().await.unwrap(), 0);

    for _ in 0..3 {
        registry.create().await.unwrap();
    }
    assert_eq!(registry.dispose_all().await.unwrap(), 3);
    assert_eq!(registry.dispose_all().await.unwrap(), 0);
}

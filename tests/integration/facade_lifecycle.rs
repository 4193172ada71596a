//! Integration tests for the digest tree facade: busy exclusion, disposal,
//! and configuration.

use super::test_utils::{tree_with, GatedFsOpener};
use fsdigest::config::FsDigestConfig;
use fsdigest::digest::{hash_bytes, Algorithm};
use fsdigest::serializer::{HashSerializer, SerializerOptions};
use fsdigest::{DigestError, DigestTree};
use std::sync::Arc;
use std::time::Duration;

async fn wait_until_queued(serializer: &HashSerializer) {
    for _ in 0..500 {
        if serializer.pending_len() == 1 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("hash request never reached the queue");
}

/// A compute in flight is neither restarted nor corrupted by overlapping calls
#[tokio::test]
async fn test_overlapping_calls_resolve_to_sentinels() {
    let temp_dir = tree_with(&[("a.txt", "x")]);
    let opener = Arc::new(GatedFsOpener::closed());
    let serializer = HashSerializer::with_opener(opener.clone(), SerializerOptions::default());
    let tree = Arc::new(DigestTree::with_serializer(serializer.clone(), "sha256"));
    assert!(tree.build(temp_dir.path()).await.unwrap());

    let first = tokio::spawn({
        let tree = Arc::clone(&tree);
        async move { tree.compute("sha256").await }
    });
    wait_until_queued(&serializer).await;
    assert!(tree.is_busy().unwrap());

    assert_eq!(tree.compute("sha256").await.unwrap(), "");
    assert_eq!(tree.report().await.unwrap(), "");
    assert!(!tree.build(temp_dir.path()).await.unwrap());

    opener.gate.add_permits(1);
    let digest = first.await.unwrap().unwrap();
    assert_eq!(digest, hash_bytes(Algorithm::Sha256, b"x"));
    assert!(!tree.is_busy().unwrap());
    assert_eq!(tree.algorithm().unwrap().as_deref(), Some("sha256"));
}

/// Disposal invalidates the instance
#[tokio::test]
async fn test_dispose() {
    let temp_dir = tree_with(&[("a.txt", "x")]);
    let tree = DigestTree::new();
    tree.build(temp_dir.path()).await.unwrap();
    assert!(tree.version().unwrap().starts_with(char::is_numeric));

    tree.dispose().unwrap();
    assert!(matches!(tree.source(), Err(DigestError::Disposed)));
    assert!(matches!(
        tree.find_duplicates().await,
        Err(DigestError::Disposed)
    ));
}

/// The configured default algorithm drives compute_default
#[tokio::test]
async fn test_from_config_default_algorithm() {
    let temp_dir = tree_with(&[("a.txt", "x")]);
    let mut config = FsDigestConfig::default();
    config.hashing.default_algorithm = "md5".to_string();

    let tree = DigestTree::from_config(&config).unwrap();
    tree.build(temp_dir.path()).await.unwrap();
    assert_eq!(
        tree.compute_default().await.unwrap(),
        hash_bytes(Algorithm::Md5, b"x")
    );
}

/// Invalid hashing settings are a configuration error
#[test]
fn test_from_config_rejects_invalid_settings() {
    let mut config = FsDigestConfig::default();
    config.hashing.default_algorithm = "crc32".to_string();
    assert!(matches!(
        DigestTree::from_config(&config),
        Err(DigestError::Config(_))
    ));
}

/// Source reflects the last successful build
#[tokio::test]
async fn test_source_introspection() {
    let temp_dir = tree_with(&[("a.txt", "x")]);
    let tree = DigestTree::new();
    assert!(tree.source().unwrap().is_none());

    tree.build(temp_dir.path()).await.unwrap();
    assert_eq!(
        tree.source().unwrap(),
        Some(fsdigest::Source::Path(temp_dir.path().to_path_buf()))
    );

    assert!(!tree.build(temp_dir.path().join("missing")).await.unwrap());
    assert!(tree.source().unwrap().is_none());
}

//! Integration tests for tree digests: determinism, content sensitivity, and
//! the directory/batch equivalence.

use super::test_utils::{tree_with, AB_DIRECTORY_SHA256};
use fsdigest::digest::{hash_bytes, Algorithm};
use fsdigest::{DigestTree, NodeKind};
use std::fs;

/// The a.txt/b.txt directory has a fixed sha256 digest
#[tokio::test]
async fn test_directory_fixture_digest() {
    let temp_dir = tree_with(&[("a.txt", "x"), ("b.txt", "y")]);
    let tree = DigestTree::new();

    assert!(tree.build(temp_dir.path()).await.unwrap());
    assert_eq!(tree.compute("sha256").await.unwrap(), AB_DIRECTORY_SHA256);
}

/// Recomputing an unchanged tree yields the same digest
#[tokio::test]
async fn test_same_filesystem_same_digest() {
    let temp_dir = tree_with(&[
        ("file1.txt", "content1"),
        ("file2.txt", "content2"),
        ("dir1/file3.txt", "content3"),
    ]);
    let tree = DigestTree::new();
    tree.build(temp_dir.path()).await.unwrap();

    let first = tree.compute("sha256").await.unwrap();
    let second = tree.compute("sha256").await.unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);

    let rebuilt = DigestTree::new();
    rebuilt.build(temp_dir.path()).await.unwrap();
    assert_eq!(rebuilt.compute("sha256").await.unwrap(), first);
}

/// Content changes are picked up by a rebuild
#[tokio::test]
async fn test_content_change_changes_digest() {
    let temp_dir = tree_with(&[("a.txt", "one"), ("b.txt", "two")]);
    let tree = DigestTree::new();
    tree.build(temp_dir.path()).await.unwrap();
    let before = tree.compute("md5").await.unwrap();

    fs::write(temp_dir.path().join("b.txt"), "three").unwrap();
    tree.build(temp_dir.path()).await.unwrap();
    let after = tree.compute("md5").await.unwrap();

    assert_ne!(before, after);
}

/// Digests depend on content only, never on names
#[tokio::test]
async fn test_renaming_files_keeps_digest() {
    let first = tree_with(&[("a.txt", "x"), ("b.txt", "y")]);
    let second = tree_with(&[("zeta.bin", "y"), ("alpha.bin", "x")]);

    let tree = DigestTree::new();
    tree.build(first.path()).await.unwrap();
    let d1 = tree.compute("sha256").await.unwrap();
    tree.build(second.path()).await.unwrap();
    let d2 = tree.compute("sha256").await.unwrap();

    assert_eq!(d1, d2);
}

/// A batch of the directory's files hashes like the directory itself
#[tokio::test]
async fn test_batch_equals_directory() {
    let temp_dir = tree_with(&[("a.txt", "x"), ("b.txt", "y")]);
    let tree = DigestTree::new();

    let batch = vec![temp_dir.path().join("b.txt"), temp_dir.path().join("a.txt")];
    assert!(tree.build(batch).await.unwrap());
    assert_eq!(tree.compute("sha256").await.unwrap(), AB_DIRECTORY_SHA256);
}

/// A single file root yields the plain file digest
#[tokio::test]
async fn test_single_file_root() {
    let temp_dir = tree_with(&[("a.txt", "abc")]);
    let tree = DigestTree::new();

    assert!(tree.build(temp_dir.path().join("a.txt")).await.unwrap());
    assert_eq!(
        tree.compute("md5").await.unwrap(),
        "900150983CD24FB0D6963F7D28E17F72"
    );
}

/// Every supported algorithm yields uppercase hex of the expected length
#[tokio::test]
async fn test_all_algorithms() {
    let temp_dir = tree_with(&[("a.txt", "x")]);
    let tree = DigestTree::new();
    tree.build(temp_dir.path()).await.unwrap();

    for algorithm in Algorithm::ALL {
        let digest = tree.compute(algorithm.name()).await.unwrap();
        assert_eq!(digest, hash_bytes(algorithm, b"x"));
        assert_eq!(digest.len(), algorithm.hex_len());
        assert_eq!(digest, digest.to_uppercase());
    }
}

/// Report lists directories before files with increasing indentation
#[tokio::test]
async fn test_report_layout() {
    let temp_dir = tree_with(&[("b.txt", "y"), ("sub/a.txt", "x")]);
    let tree = DigestTree::new();
    tree.build(temp_dir.path()).await.unwrap();
    tree.compute("sha256").await.unwrap();

    let records = tree.records().await.unwrap();
    let kinds: Vec<(NodeKind, usize)> = records.iter().map(|r| (r.kind, r.depth)).collect();
    assert_eq!(
        kinds,
        vec![
            (NodeKind::Directory, 0),
            (NodeKind::Directory, 1),
            (NodeKind::File, 2),
            (NodeKind::File, 1),
        ]
    );

    let report = tree.report().await.unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "Type;Source;Digest");
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("(D);>"));
    assert!(lines[2].starts_with("(D);  >"));
    assert!(lines[3].starts_with("(F);    >"));
    assert!(lines[3].ends_with(&hash_bytes(Algorithm::Sha256, b"x")));
    assert!(lines[4].starts_with("(F);  >"));
}

/// Empty subdirectories contribute nothing to the parent digest
#[tokio::test]
async fn test_empty_subdirectory_is_neutral() {
    let temp_dir = tree_with(&[("a.txt", "x"), ("b.txt", "y")]);
    fs::create_dir(temp_dir.path().join("empty")).unwrap();

    let tree = DigestTree::new();
    assert!(tree.build(temp_dir.path()).await.unwrap());
    assert_eq!(tree.compute("sha256").await.unwrap(), AB_DIRECTORY_SHA256);
}

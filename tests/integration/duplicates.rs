//! Integration tests for duplicate detection

use super::test_utils::tree_with;
use fsdigest::digest::{hash_bytes, Algorithm};
use fsdigest::{DigestTree, Source};

/// Two identical files out of three form exactly one duplicate group
#[tokio::test]
async fn test_two_of_three_files_duplicate() {
    let temp_dir = tree_with(&[
        ("one.txt", "same"),
        ("two.txt", "other"),
        ("three.txt", "same"),
    ]);
    let paths = vec![
        temp_dir.path().join("one.txt"),
        temp_dir.path().join("two.txt"),
        temp_dir.path().join("three.txt"),
    ];

    let tree = DigestTree::new();
    assert!(tree.build(paths).await.unwrap());
    tree.compute("sha256").await.unwrap();

    let duplicates = tree.find_duplicates().await.unwrap();
    assert_eq!(duplicates.len(), 1);

    let sources = &duplicates[&hash_bytes(Algorithm::Sha256, b"same")];
    assert_eq!(sources.len(), 2);
    assert!(sources.contains(&Source::Path(temp_dir.path().join("one.txt"))));
    assert!(sources.contains(&Source::Path(temp_dir.path().join("three.txt"))));
    assert!(!sources.contains(&Source::Path(temp_dir.path().join("two.txt"))));
}

/// Identical subtrees are reported as duplicate directories
#[tokio::test]
async fn test_identical_directories_duplicate() {
    let temp_dir = tree_with(&[
        ("left/a.txt", "x"),
        ("left/b.txt", "y"),
        ("right/c.txt", "x"),
        ("right/d.txt", "y"),
    ]);

    let tree = DigestTree::new();
    tree.build(temp_dir.path()).await.unwrap();
    tree.compute("sha256").await.unwrap();

    let duplicates = tree.find_duplicates().await.unwrap();
    let dirs = &duplicates[super::test_utils::AB_DIRECTORY_SHA256];
    assert_eq!(
        dirs,
        &vec![
            Source::Path(temp_dir.path().join("left")),
            Source::Path(temp_dir.path().join("right")),
        ]
    );
    assert_eq!(duplicates[&hash_bytes(Algorithm::Sha256, b"x")].len(), 2);
    assert_eq!(duplicates[&hash_bytes(Algorithm::Sha256, b"y")].len(), 2);
}

/// Uncomputed trees have no duplicates
#[tokio::test]
async fn test_no_duplicates_before_compute() {
    let temp_dir = tree_with(&[("a.txt", "x"), ("b.txt", "x")]);
    let tree = DigestTree::new();
    tree.build(temp_dir.path()).await.unwrap();

    assert!(tree.find_duplicates().await.unwrap().is_empty());
}

//! Property-based tests for order independence and determinism

use fsdigest::digest::{hash_bytes, Algorithm, DigestEngine};
use fsdigest::tree::combine_digests;
use fsdigest::DigestTree;
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

fn algorithm_strategy() -> impl Strategy<Value = Algorithm> {
    prop::sample::select(Algorithm::ALL.to_vec())
}

/// Combining child digests does not depend on their order
#[test]
fn test_combination_order_independence_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                prop::collection::vec(prop::option::of(any::<Vec<u8>>()), 0..12),
                algorithm_strategy(),
                any::<u64>(),
            ),
            |(contents, algorithm, seed)| {
                let digests: Vec<Option<String>> = contents
                    .iter()
                    .map(|c| c.as_ref().map(|bytes| hash_bytes(algorithm, bytes)))
                    .collect();

                let mut shuffled = digests.clone();
                let len = shuffled.len();
                if len > 1 {
                    let rotate = (seed as usize) % len;
                    shuffled.rotate_left(rotate);
                    shuffled.reverse();
                }

                let a = combine_digests("p", algorithm.name(), digests).unwrap();
                let b = combine_digests("p", algorithm.name(), shuffled).unwrap();
                prop_assert_eq!(a, b);
                Ok(())
            },
        )
        .unwrap();
}

/// The fold seeds with the smallest digest and hashes the rest in order
#[test]
fn test_combination_matches_reference_fold_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &prop::collection::vec(any::<Vec<u8>>(), 1..8),
            |contents| {
                let mut digests: Vec<String> = contents
                    .iter()
                    .map(|bytes| hash_bytes(Algorithm::Sha256, bytes))
                    .collect();
                let combined =
                    combine_digests("p", "sha256", digests.iter().cloned().map(Some).collect())
                        .unwrap()
                        .unwrap();

                digests.sort();
                let expected = if digests.len() == 1 {
                    digests[0].clone()
                } else {
                    let mut engine = DigestEngine::new(Algorithm::Sha256);
                    for digest in &digests[1..] {
                        engine.update(digest.as_bytes());
                    }
                    engine.finalize_hex()
                };
                prop_assert_eq!(combined, expected);
                Ok(())
            },
        )
        .unwrap();
}

/// Directories whose files carry the same contents under any names share a digest
#[test]
fn test_directory_digest_ignores_names_property() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut runner = proptest::test_runner::TestRunner::new(proptest::test_runner::Config {
        cases: 16,
        ..Default::default()
    });

    runner
        .run(
            &prop::collection::vec(any::<Vec<u8>>(), 1..6),
            |contents| {
                let first = TempDir::new().unwrap();
                let second = TempDir::new().unwrap();
                for (i, bytes) in contents.iter().enumerate() {
                    fs::write(first.path().join(format!("f{}.bin", i)), bytes).unwrap();
                    fs::write(second.path().join(format!("z{}.dat", 100 - i)), bytes).unwrap();
                }

                let (d1, d2) = rt.block_on(async {
                    let tree = DigestTree::new();
                    tree.build(first.path()).await.unwrap();
                    let d1 = tree.compute("md5").await.unwrap();
                    tree.build(second.path()).await.unwrap();
                    let d2 = tree.compute("md5").await.unwrap();
                    (d1, d2)
                });
                prop_assert!(!d1.is_empty());
                prop_assert_eq!(d1, d2);
                Ok(())
            },
        )
        .unwrap();
}

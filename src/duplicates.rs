//! Digest to sources multimap over a flattened report.

use crate::tree::{NodeKind, NodeRecord, Source};
use std::collections::BTreeMap;

/// Digest to every source that produced it, in report order.
pub type DuplicateMap = BTreeMap<String, Vec<Source>>;

/// Index every digest-bearing file and directory record.
///
/// Batch records are skipped; their source is the whole path list.
pub fn index_by_digest(records: &[NodeRecord]) -> DuplicateMap {
    let mut index = DuplicateMap::new();
    for record in records {
        if record.kind == NodeKind::Batch {
            continue;
        }
        if let Some(digest) = &record.digest {
            index
                .entry(digest.clone())
                .or_default()
                .push(record.source.clone());
        }
    }
    index
}

/// Keep only digests shared by two or more sources.
pub fn find_duplicates(records: &[NodeRecord]) -> DuplicateMap {
    let mut index = index_by_digest(records);
    index.retain(|_, sources| sources.len() > 1);
    index
}

//! Node classification by probing the filesystem.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::trace;

/// What a source turned out to be when classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Directory,
    File,
    /// Root-only pseudo-directory over an explicit path list
    Batch,
    /// Exists but is neither a regular file nor a directory
    Other,
    /// Missing or not stat-able
    Invalid,
}

impl NodeKind {
    /// Type column code used in reports.
    pub fn code(self) -> &'static str {
        match self {
            NodeKind::Directory => "(D)",
            NodeKind::File => "(F)",
            NodeKind::Batch => "(B)",
            NodeKind::Other => "(O)",
            NodeKind::Invalid => "(I)",
        }
    }

    /// Kinds that have a concrete node variant.
    pub fn is_concrete(self) -> bool {
        matches!(self, NodeKind::Directory | NodeKind::File | NodeKind::Batch)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Directory => "directory",
            NodeKind::File => "file",
            NodeKind::Batch => "batch",
            NodeKind::Other => "other",
            NodeKind::Invalid => "invalid",
        };
        f.write_str(name)
    }
}

/// Classify a single path. Symlinks are followed.
pub async fn classify(path: &Path) -> NodeKind {
    let kind = match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => NodeKind::File,
        Ok(meta) if meta.is_dir() => NodeKind::Directory,
        Ok(_) => NodeKind::Other,
        Err(e) => {
            trace!(path = %path.display(), error = %e, "Path is not stat-able");
            NodeKind::Invalid
        }
    };
    trace!(path = %path.display(), kind = %kind, "Classified path");
    kind
}

/// Classify a path list: `Batch` iff it is non-empty and every element is a
/// file or directory.
pub async fn classify_batch(paths: &[PathBuf]) -> NodeKind {
    if paths.is_empty() {
        return NodeKind::Invalid;
    }
    let kinds = join_all(paths.iter().map(|p| classify(p))).await;
    if kinds
        .iter()
        .all(|k| matches!(k, NodeKind::File | NodeKind::Directory))
    {
        NodeKind::Batch
    } else {
        NodeKind::Invalid
    }
}

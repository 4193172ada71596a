//! Node abstraction shared by the File, Directory, and Batch variants.

use crate::error::DigestError;
use crate::serializer::HashSerializer;
use crate::tree::batch::BatchNode;
use crate::tree::directory::DirectoryNode;
use crate::tree::file::FileNode;
use crate::tree::kind::NodeKind;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What a node hashes: one path, or an explicit list for a batch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Source {
    Path(PathBuf),
    Batch(Vec<PathBuf>),
}

impl Source {
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Source::Path(path) => Some(path),
            Source::Batch(_) => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => write!(f, "{}", path.display()),
            Source::Batch(paths) => {
                for (i, path) in paths.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", path.display())?;
                }
                Ok(())
            }
        }
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}

impl From<&str> for Source {
    fn from(path: &str) -> Self {
        Source::Path(PathBuf::from(path))
    }
}

impl From<Vec<PathBuf>> for Source {
    fn from(paths: Vec<PathBuf>) -> Self {
        Source::Batch(paths)
    }
}

impl From<Vec<&str>> for Source {
    fn from(paths: Vec<&str>) -> Self {
        Source::Batch(paths.into_iter().map(PathBuf::from).collect())
    }
}

/// One row of a flattened report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRecord {
    pub kind: NodeKind,
    pub source: Source,
    pub depth: usize,
    pub digest: Option<String>,
}

/// Result of computing one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDigest {
    pub source: Option<Source>,
    pub digest: Option<String>,
}

impl NodeDigest {
    pub(crate) fn absent(source: Option<Source>) -> Self {
        Self {
            source,
            digest: None,
        }
    }
}

/// A node in the hash tree.
///
/// Every operation takes `&self`; a per-node busy flag rejects re-entrant
/// calls, which resolve to a sentinel (`false`, absent digest, `None`)
/// instead of waiting.
#[async_trait]
pub trait FsNode: Send + Sync + fmt::Debug {
    fn kind(&self) -> NodeKind;

    /// None until a build succeeds.
    fn source(&self) -> Option<Source>;

    fn depth(&self) -> usize;

    /// None until a compute succeeds.
    fn digest(&self) -> Option<String>;

    fn is_busy(&self) -> bool;

    /// Probe the filesystem and populate this node (and its subtree).
    ///
    /// `Ok(false)` for absorbed failures: busy node, unreadable or vanished
    /// paths, a batch below the root. `Err` only for contract violations such
    /// as a path whose observed type differs from this variant.
    async fn build(&self, source: Source, depth: usize) -> Result<bool, DigestError>;

    /// Hash this node with the named algorithm.
    async fn compute(&self, algorithm: &str) -> Result<NodeDigest, DigestError>;

    /// Pre-order flattening of this subtree; None if busy or unbuilt.
    async fn report(&self) -> Option<Vec<NodeRecord>>;
}

/// Mutable per-node fields, never held across an await.
#[derive(Debug, Default)]
pub(crate) struct NodeState {
    pub source: Option<Source>,
    pub depth: usize,
    pub digest: Option<String>,
}

impl NodeState {
    pub fn record(&self, kind: NodeKind) -> Option<NodeRecord> {
        Some(NodeRecord {
            kind,
            source: self.source.clone()?,
            depth: self.depth,
            digest: self.digest.clone(),
        })
    }
}

/// Per-node mutual exclusion marker.
#[derive(Debug, Default)]
pub(crate) struct BusyFlag(AtomicBool);

impl BusyFlag {
    pub fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(&self.0))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Clears the busy flag when the operation ends, including on early return.
pub(crate) struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Construct an empty node of the variant matching `kind`.
pub fn new_node(
    kind: NodeKind,
    serializer: &HashSerializer,
) -> Result<Arc<dyn FsNode>, DigestError> {
    match kind {
        NodeKind::File => Ok(Arc::new(FileNode::new(serializer.clone()))),
        NodeKind::Directory => Ok(Arc::new(DirectoryNode::new(serializer.clone()))),
        NodeKind::Batch => Ok(Arc::new(BatchNode::new(serializer.clone()))),
        NodeKind::Other | NodeKind::Invalid => Err(DigestError::AbstractViolation(kind)),
    }
}

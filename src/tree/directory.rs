//! Directory node: children are the directory's entries.

use crate::error::DigestError;
use crate::serializer::HashSerializer;
use crate::tree::children::Branch;
use crate::tree::kind::{classify, NodeKind};
use crate::tree::node::{FsNode, NodeDigest, NodeRecord, Source};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

#[derive(Debug)]
pub struct DirectoryNode {
    branch: Branch,
}

impl DirectoryNode {
    pub fn new(serializer: HashSerializer) -> Self {
        Self {
            branch: Branch::new(NodeKind::Directory, serializer),
        }
    }

    pub fn children(&self) -> Vec<std::sync::Arc<dyn FsNode>> {
        self.branch.children()
    }
}

async fn list_entries(path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(path).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        paths.push(entry.path());
    }
    Ok(paths)
}

#[async_trait]
impl FsNode for DirectoryNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Directory
    }

    fn source(&self) -> Option<Source> {
        self.branch.source()
    }

    fn depth(&self) -> usize {
        self.branch.depth()
    }

    fn digest(&self) -> Option<String> {
        self.branch.digest()
    }

    fn is_busy(&self) -> bool {
        self.branch.is_busy()
    }

    #[instrument(skip(self, source), fields(source = %source))]
    async fn build(&self, source: Source, depth: usize) -> Result<bool, DigestError> {
        let Some(_guard) = self.branch.try_acquire() else {
            return Ok(false);
        };
        let path = match &source {
            Source::Path(path) => path.clone(),
            Source::Batch(paths) => {
                return Err(DigestError::TypeMismatch {
                    path: paths.first().cloned().unwrap_or_default(),
                    expected: NodeKind::Directory,
                    observed: NodeKind::Batch,
                })
            }
        };

        match classify(&path).await {
            NodeKind::Directory => {}
            NodeKind::Invalid => {
                debug!(path = %path.display(), "Directory vanished before build");
                return Ok(false);
            }
            observed => {
                return Err(DigestError::TypeMismatch {
                    path,
                    expected: NodeKind::Directory,
                    observed,
                })
            }
        }

        let entries = match list_entries(&path).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot list directory");
                return Ok(false);
            }
        };

        self.branch.populate(source, depth, entries).await
    }

    async fn compute(&self, algorithm: &str) -> Result<NodeDigest, DigestError> {
        let Some(_guard) = self.branch.try_acquire() else {
            return Ok(NodeDigest::absent(self.branch.source()));
        };
        self.branch.compute(algorithm).await
    }

    async fn report(&self) -> Option<Vec<NodeRecord>> {
        let _guard = self.branch.try_acquire()?;
        self.branch.report().await
    }
}

//! Batch node: a root-only pseudo-directory over an explicit path list.

use crate::error::DigestError;
use crate::serializer::HashSerializer;
use crate::tree::children::Branch;
use crate::tree::kind::{classify, classify_batch, NodeKind};
use crate::tree::node::{FsNode, NodeDigest, NodeRecord, Source};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub struct BatchNode {
    branch: Branch,
}

impl BatchNode {
    pub fn new(serializer: HashSerializer) -> Self {
        Self {
            branch: Branch::new(NodeKind::Batch, serializer),
        }
    }

    pub fn children(&self) -> Vec<Arc<dyn FsNode>> {
        self.branch.children()
    }
}

#[async_trait]
impl FsNode for BatchNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Batch
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

    async fn build(&self, source: Source, depth: usize) -> Result<bool, DigestError> {
        let Some(_guard) = self.branch.try_acquire() else {
            return Ok(false);
        };
        if depth != 0 {
            warn!(depth, "Batch nodes are only valid at the root");
            return Ok(false);
        }
        let paths = match &source {
            Source::Batch(paths) => paths.clone(),
            Source::Path(path) => {
                return Err(DigestError::TypeMismatch {
                    path: path.clone(),
                    expected: NodeKind::Batch,
                    observed: classify(path).await,
                })
            }
        };
        if classify_batch(&paths).await != NodeKind::Batch {
            warn!(count = paths.len(), "Batch contains an unusable path");
            return Ok(false);
        }

        self.branch.populate(source, depth, paths).await
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

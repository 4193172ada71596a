//! File node: a leaf hashed through the serializer.

use crate::error::DigestError;
use crate::serializer::HashSerializer;
use crate::tree::kind::{classify, NodeKind};
use crate::tree::node::{BusyFlag, FsNode, NodeDigest, NodeRecord, NodeState, Source};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, instrument};

#[derive(Debug)]
pub struct FileNode {
    serializer: HashSerializer,
    state: Mutex<NodeState>,
    busy: BusyFlag,
}

impl FileNode {
    pub fn new(serializer: HashSerializer) -> Self {
        Self {
            serializer,
            state: Mutex::new(NodeState::default()),
            busy: BusyFlag::default(),
        }
    }
}

#[async_trait]
impl FsNode for FileNode {
    fn kind(&self) -> NodeKind {
        NodeKind::File
    }

    fn source(&self) -> Option<Source> {
        self.state.lock().source.clone()
    }

    fn depth(&self) -> usize {
        self.state.lock().depth
    }

    fn digest(&self) -> Option<String> {
        self.state.lock().digest.clone()
    }

    fn is_busy(&self) -> bool {
        self.busy.is_set()
    }

    async fn build(&self, source: Source, depth: usize) -> Result<bool, DigestError> {
        let Some(_guard) = self.busy.try_acquire() else {
            return Ok(false);
        };
        let path = match &source {
            Source::Path(path) => path.clone(),
            Source::Batch(paths) => {
                return Err(DigestError::TypeMismatch {
                    path: paths.first().cloned().unwrap_or_default(),
                    expected: NodeKind::File,
                    observed: NodeKind::Batch,
                })
            }
        };

        match classify(&path).await {
            NodeKind::File => {
                let mut state = self.state.lock();
                state.source = Some(source);
                state.depth = depth;
                state.digest = None;
                Ok(true)
            }
            NodeKind::Invalid => {
                debug!(path = %path.display(), "File vanished before build");
                Ok(false)
            }
            observed => Err(DigestError::TypeMismatch {
                path,
                expected: NodeKind::File,
                observed,
            }),
        }
    }

    #[instrument(skip(self))]
    async fn compute(&self, algorithm: &str) -> Result<NodeDigest, DigestError> {
        let Some(_guard) = self.busy.try_acquire() else {
            return Ok(NodeDigest::absent(self.source()));
        };
        let Some(source) = self.source() else {
            return Ok(NodeDigest::absent(None));
        };
        let Some(path) = source.as_path() else {
            return Ok(NodeDigest::absent(Some(source)));
        };

        let outcome = self.serializer.submit(path, algorithm).wait().await;
        if !outcome.is_ok() {
            debug!(status = ?outcome.status, "File hash did not complete");
        }

        self.state.lock().digest = outcome.digest.clone();
        Ok(NodeDigest {
            source: Some(source),
            digest: outcome.digest,
        })
    }

    async fn report(&self) -> Option<Vec<NodeRecord>> {
        let _guard = self.busy.try_acquire()?;
        let record = self.state.lock().record(NodeKind::File)?;
        Some(vec![record])
    }
}

//! Child-set handling shared by directory and batch nodes.
//!
//! Both variants own a `Branch`; they differ only in where the child path
//! list comes from at build time.

use crate::error::DigestError;
use crate::serializer::HashSerializer;
use crate::tree::combine::combine_digests;
use crate::tree::kind::{classify, NodeKind};
use crate::tree::node::{
    new_node, BusyFlag, BusyGuard, FsNode, NodeDigest, NodeRecord, NodeState, Source,
};
use futures::future::join_all;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Debug)]
pub(crate) struct Branch {
    kind: NodeKind,
    serializer: HashSerializer,
    state: Mutex<NodeState>,
    children: Mutex<Vec<Arc<dyn FsNode>>>,
    busy: BusyFlag,
}

impl Branch {
    pub fn new(kind: NodeKind, serializer: HashSerializer) -> Self {
        Self {
            kind,
            serializer,
            state: Mutex::new(NodeState::default()),
            children: Mutex::new(Vec::new()),
            busy: BusyFlag::default(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn source(&self) -> Option<Source> {
        self.state.lock().source.clone()
    }

    pub fn depth(&self) -> usize {
        self.state.lock().depth
    }

    pub fn digest(&self) -> Option<String> {
        self.state.lock().digest.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_set()
    }

    pub fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.busy.try_acquire()
    }

    pub fn children(&self) -> Vec<Arc<dyn FsNode>> {
        self.children.lock().clone()
    }

    /// Classify and build every child path concurrently.
    ///
    /// The caller holds the busy guard. The result is the AND of all child
    /// builds; a child type mismatch propagates as an error.
    pub async fn populate(
        &self,
        source: Source,
        depth: usize,
        paths: Vec<PathBuf>,
    ) -> Result<bool, DigestError> {
        {
            let mut state = self.state.lock();
            state.source = Some(source);
            state.depth = depth;
            state.digest = None;
        }
        self.children.lock().clear();

        let kinds = join_all(paths.iter().map(|p| classify(p))).await;

        let mut nodes = Vec::with_capacity(paths.len());
        for (path, kind) in paths.into_iter().zip(kinds) {
            if !matches!(kind, NodeKind::File | NodeKind::Directory) {
                warn!(path = %path.display(), kind = %kind, "Child is neither file nor directory");
                return Ok(false);
            }
            nodes.push((new_node(kind, &self.serializer)?, path));
        }

        let results = join_all(
            nodes
                .iter()
                .map(|(node, path)| node.build(Source::Path(path.clone()), depth + 1)),
        )
        .await;

        let mut built = true;
        for result in results {
            built &= result?;
        }

        let mut children: Vec<Arc<dyn FsNode>> =
            nodes.into_iter().map(|(node, _)| node).collect();
        children.sort_by(report_order);
        debug!(
            kind = %self.kind,
            child_count = children.len(),
            built,
            "Populated children"
        );
        *self.children.lock() = children;

        Ok(built)
    }

    /// Compute all children concurrently and combine their digests.
    ///
    /// The caller holds the busy guard.
    pub async fn compute(&self, algorithm: &str) -> Result<NodeDigest, DigestError> {
        let Some(source) = self.source() else {
            return Ok(NodeDigest::absent(None));
        };

        let children = self.children();
        let results = join_all(children.iter().map(|child| child.compute(algorithm))).await;

        let digests: Vec<Option<String>> = results
            .into_iter()
            .map(|result| match result {
                Ok(child) => child.digest,
                Err(e) => {
                    warn!(error = %e, "Child digest unavailable");
                    None
                }
            })
            .collect();

        match combine_digests(&source.to_string(), algorithm, digests) {
            Ok(digest) => {
                self.state.lock().digest = digest.clone();
                Ok(NodeDigest {
                    source: Some(source),
                    digest,
                })
            }
            Err(e) => {
                error!(error = %e, "Failed to combine child digests");
                self.state.lock().digest = None;
                Err(e)
            }
        }
    }

    /// Own record followed by each child's report, in report order.
    ///
    /// The caller holds the busy guard.
    pub async fn report(&self) -> Option<Vec<NodeRecord>> {
        let own = self.state.lock().record(self.kind)?;
        let children = self.children();
        let reports = join_all(children.iter().map(|child| child.report())).await;

        let mut records = vec![own];
        for report in reports.into_iter().flatten() {
            records.extend(report);
        }
        Some(records)
    }
}

/// Directories before files, then by source path within each group.
fn report_order(a: &Arc<dyn FsNode>, b: &Arc<dyn FsNode>) -> Ordering {
    let rank = |node: &Arc<dyn FsNode>| match node.kind() {
        NodeKind::Directory => 0,
        _ => 1,
    };
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.source().cmp(&b.source()))
}

//! Public entry point over one hash tree.
//!
//! `DigestTree` owns the root node and exposes build, compute, report, and
//! duplicate detection. Operations on a tree that is already mid-operation
//! resolve to sentinels (`false`, `""`, empty collections) rather than
//! waiting. After `dispose`, every call fails with `DigestError::Disposed`.

use crate::config::FsDigestConfig;
use crate::digest::Algorithm;
use crate::duplicates::{self, DuplicateMap};
use crate::error::DigestError;
use crate::report::render_csv;
use crate::serializer::HashSerializer;
use crate::tree::node::BusyFlag;
use crate::tree::{classify, classify_batch, new_node, FsNode, NodeRecord, Source};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Default)]
struct TreeState {
    root: Option<Arc<dyn FsNode>>,
    algorithm: Option<String>,
}

/// Hash tree facade
///
/// Cheap to construct; the serializer handle is shared with every file node
/// the tree creates.
#[derive(Debug)]
pub struct DigestTree {
    serializer: HashSerializer,
    default_algorithm: String,
    state: Mutex<TreeState>,
    busy: BusyFlag,
    disposed: AtomicBool,
}

impl DigestTree {
    /// Tree with its own filesystem serializer, hashing with sha256 by default.
    ///
    /// Use [`DigestTree::with_serializer`] with [`HashSerializer::shared`] to
    /// route several trees through one admission queue.
    pub fn new() -> Self {
        Self::with_serializer(HashSerializer::new(), Algorithm::default().name())
    }

    pub fn with_serializer(
        serializer: HashSerializer,
        default_algorithm: impl Into<String>,
    ) -> Self {
        Self {
            serializer,
            default_algorithm: default_algorithm.into(),
            state: Mutex::new(TreeState::default()),
            busy: BusyFlag::default(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Tree with its own serializer built from `config.hashing`.
    pub fn from_config(config: &FsDigestConfig) -> Result<Self, DigestError> {
        let serializer = HashSerializer::from_config(&config.hashing)?;
        Ok(Self::with_serializer(
            serializer,
            config.hashing.default_algorithm.clone(),
        ))
    }

    fn ensure_live(&self) -> Result<(), DigestError> {
        if self.disposed.load(Ordering::Acquire) {
            Err(DigestError::Disposed)
        } else {
            Ok(())
        }
    }

    pub fn version(&self) -> Result<&'static str, DigestError> {
        self.ensure_live()?;
        Ok(env!("CARGO_PKG_VERSION"))
    }

    /// Root source of the last successful build.
    pub fn source(&self) -> Result<Option<Source>, DigestError> {
        self.ensure_live()?;
        Ok(self.state.lock().root.as_ref().and_then(|root| root.source()))
    }

    /// Algorithm of the last successful compute.
    pub fn algorithm(&self) -> Result<Option<String>, DigestError> {
        self.ensure_live()?;
        Ok(self.state.lock().algorithm.clone())
    }

    pub fn default_algorithm(&self) -> &str {
        &self.default_algorithm
    }

    pub fn is_busy(&self) -> Result<bool, DigestError> {
        self.ensure_live()?;
        Ok(self.busy.is_set())
    }

    /// Build the tree for a single path or a batch of paths.
    ///
    /// Resolves `true` iff the whole subtree built. An empty path is an
    /// invalid argument; an empty batch, a missing root, or a root that is
    /// neither a file nor a directory resolves `false`.
    #[instrument(skip(self, source))]
    pub async fn build(&self, source: impl Into<Source>) -> Result<bool, DigestError> {
        self.ensure_live()?;
        let source = source.into();
        validate_source(&source)?;

        let Some(_guard) = self.busy.try_acquire() else {
            warn!("Build requested while tree is busy");
            return Ok(false);
        };

        {
            let mut state = self.state.lock();
            state.root = None;
            state.algorithm = None;
        }

        let kind = match &source {
            Source::Path(path) => classify(path).await,
            Source::Batch(paths) => classify_batch(paths).await,
        };
        if !kind.is_concrete() {
            warn!(source = %source, kind = %kind, "Root cannot be built");
            return Ok(false);
        }

        let root = new_node(kind, &self.serializer)?;
        let built = root.build(source.clone(), 0).await?;
        info!(source = %source, kind = %kind, built, "Built digest tree");

        if built {
            self.state.lock().root = Some(root);
        }
        Ok(built)
    }

    /// Compute the root digest with the named algorithm.
    ///
    /// Resolves the uppercase hex digest, or `""` when the tree is unbuilt,
    /// busy, empty, or the combination failed.
    #[instrument(skip(self))]
    pub async fn compute(&self, algorithm: &str) -> Result<String, DigestError> {
        self.ensure_live()?;
        let Some(_guard) = self.busy.try_acquire() else {
            warn!("Compute requested while tree is busy");
            return Ok(String::new());
        };
        let root = self.state.lock().root.clone();
        let Some(root) = root else {
            return Ok(String::new());
        };

        match root.compute(algorithm).await {
            Ok(result) => match result.digest {
                Some(digest) => {
                    self.state.lock().algorithm = Some(algorithm.to_string());
                    info!(digest = %digest, "Computed digest tree");
                    Ok(digest)
                }
                None => {
                    warn!(algorithm, "Root digest is absent");
                    Ok(String::new())
                }
            },
            Err(e) => {
                error!(error = %e, "Digest computation failed");
                Ok(String::new())
            }
        }
    }

    /// Compute with the configured default algorithm.
    pub async fn compute_default(&self) -> Result<String, DigestError> {
        let algorithm = self.default_algorithm.clone();
        self.compute(&algorithm).await
    }

    /// Flattened records in report order; empty when unbuilt or busy.
    pub async fn records(&self) -> Result<Vec<NodeRecord>, DigestError> {
        self.ensure_live()?;
        let Some(_guard) = self.busy.try_acquire() else {
            return Ok(Vec::new());
        };
        let root = self.state.lock().root.clone();
        let Some(root) = root else {
            return Ok(Vec::new());
        };
        Ok(root.report().await.unwrap_or_default())
    }

    /// Semicolon CSV report; `""` when unbuilt or busy.
    pub async fn report(&self) -> Result<String, DigestError> {
        let records = self.records().await?;
        if records.is_empty() {
            return Ok(String::new());
        }
        render_csv(&records)
    }

    /// Digests shared by two or more sources.
    pub async fn find_duplicates(&self) -> Result<DuplicateMap, DigestError> {
        let records = self.records().await?;
        Ok(duplicates::find_duplicates(&records))
    }

    /// Release the tree. Later calls, including a second dispose, fail.
    pub fn dispose(&self) -> Result<(), DigestError> {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return Err(DigestError::Disposed);
        }
        *self.state.lock() = TreeState::default();
        info!("Disposed digest tree");
        Ok(())
    }
}

impl Default for DigestTree {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_source(source: &Source) -> Result<(), DigestError> {
    let empty = match source {
        Source::Path(path) => path.as_os_str().is_empty(),
        Source::Batch(paths) => paths.iter().any(|p| p.as_os_str().is_empty()),
    };
    if empty {
        return Err(DigestError::InvalidArgument(
            "source path must not be empty".to_string(),
        ));
    }
    Ok(())
}

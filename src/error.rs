//! Error types for the fsdigest hashing system.

use crate::tree::kind::NodeKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by tree, serializer, and facade operations.
///
/// Normal file-system failures (missing paths, busy nodes, unreadable files)
/// never surface here; those resolve to `false`, `""`, or an absent digest.
/// This type covers contract violations and combination failures.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Type mismatch at {path:?}: expected {expected}, observed {observed}")]
    TypeMismatch {
        path: PathBuf,
        expected: NodeKind,
        observed: NodeKind,
    },

    #[error("No concrete node variant exists for kind {0}")]
    AbstractViolation(NodeKind),

    /// Instantiation of a type that has no public constructor. The hash
    /// serializer is an ordinary value, so no current path returns this.
    #[error("Cannot create {0}")]
    NotCreatable(String),

    #[error("Hash error for {node} ({algorithm}): {detail}")]
    Hash {
        node: String,
        algorithm: String,
        detail: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Digest tree is no longer registered (already disposed)")]
    Disposed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DigestError {
    /// Build a combination/primitive failure for the given source.
    pub fn hash(
        node: impl Into<String>,
        algorithm: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        DigestError::Hash {
            node: node.into(),
            algorithm: algorithm.into(),
            detail: detail.into(),
        }
    }
}

impl From<config::ConfigError> for DigestError {
    fn from(err: config::ConfigError) -> Self {
        DigestError::Config(err.to_string())
    }
}

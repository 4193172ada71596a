//! fsdigest: order-independent content digests
//!
//! Computes digests for a file, a directory tree, or an unordered batch of
//! paths so that identical content yields the same digest regardless of
//! traversal order, and finds duplicates among the results. File opens are
//! admitted through a queue that backs off when the process runs out of
//! file descriptors.

pub mod cli;
pub mod config;
pub mod digest;
pub mod duplicates;
pub mod error;
pub mod facade;
pub mod logging;
pub mod report;
pub mod serializer;
pub mod tree;

pub use digest::Algorithm;
pub use duplicates::DuplicateMap;
pub use error::DigestError;
pub use facade::DigestTree;
pub use serializer::{HashOutcome, HashSerializer, HashStatus, SerializerOptions};
pub use tree::{FsNode, NodeKind, NodeRecord, Source};

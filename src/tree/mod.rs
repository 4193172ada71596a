//! Hash tree over files, directories, and batches.
//!
//! Nodes are built by probing the filesystem, then computed bottom-up: file
//! leaves are hashed through the serializer and parents combine their
//! children's digests.

pub mod batch;
mod children;
pub mod combine;
pub mod directory;
pub mod file;
pub mod kind;
pub mod node;

pub use batch::BatchNode;
pub use combine::combine_digests;
pub use directory::DirectoryNode;
pub use file::FileNode;
pub use kind::{classify, classify_batch, NodeKind};
pub use node::{new_node, FsNode, NodeDigest, NodeRecord, Source};

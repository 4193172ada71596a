//! Integration tests for fsdigest

mod duplicates;
mod facade_lifecycle;
mod test_utils;
mod tree_digest;

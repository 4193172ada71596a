//! Property-based tests for fsdigest

mod determinism;

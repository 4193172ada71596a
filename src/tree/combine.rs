//! Deterministic combination of child digests into a parent digest.
//!
//! Children are sorted by digest string (not by name), so the result does
//! not depend on directory listing order. The first present digest seeds the
//! running value unchanged; every later digest is fed to a single
//! accumulator and the running value becomes the accumulator's snapshot.
//! A parent with exactly one digest-bearing child therefore carries that
//! child's digest verbatim.

use crate::digest::{Algorithm, DigestEngine};
use crate::error::DigestError;

/// Fold child digests for `node` with the named algorithm.
///
/// Returns `Ok(None)` when no child produced a digest. An unknown algorithm
/// is a combination failure even when there is nothing to fold.
pub fn combine_digests(
    node: &str,
    algorithm: &str,
    mut digests: Vec<Option<String>>,
) -> Result<Option<String>, DigestError> {
    digests.sort();

    let parsed = algorithm.parse::<Algorithm>().map_err(|e| {
        DigestError::hash(node, algorithm, format!("cannot initialise accumulator: {}", e))
    })?;
    let mut engine = DigestEngine::new(parsed);

    let mut running: Option<String> = None;
    for digest in digests.into_iter().flatten() {
        if running.is_none() {
            running = Some(digest);
            continue;
        }
        engine.update(digest.as_bytes());
        running = Some(engine.snapshot_hex());
    }

    Ok(running)
}

//! Digest engine: streaming hash primitives producing uppercase hex digests.
//!
//! Wraps the `sha2` family and `md5` behind one enum so callers can feed
//! bytes incrementally and take a snapshot of the running digest without
//! consuming the accumulator.

use crate::error::DigestError;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

/// Hash algorithms recognised by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Md5,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Md5,
        Algorithm::Sha224,
        Algorithm::Sha256,
        Algorithm::Sha384,
        Algorithm::Sha512,
    ];

    /// Canonical lowercase name, as accepted by `from_str`.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Sha224 => "sha224",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha384 => "sha384",
            Algorithm::Sha512 => "sha512",
        }
    }

    /// Length of a digest in hex characters.
    pub fn hex_len(self) -> usize {
        match self {
            Algorithm::Md5 => 32,
            Algorithm::Sha224 => 56,
            Algorithm::Sha256 => 64,
            Algorithm::Sha384 => 96,
            Algorithm::Sha512 => 128,
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Sha256
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name() == lowered)
            .ok_or_else(|| DigestError::InvalidArgument(format!("Unknown hash algorithm: {}", s)))
    }
}

/// Incremental digest accumulator for one algorithm.
#[derive(Clone)]
pub enum DigestEngine {
    Md5(md5::Context),
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl DigestEngine {
    pub fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Md5 => DigestEngine::Md5(md5::Context::new()),
            Algorithm::Sha224 => DigestEngine::Sha224(Sha224::new()),
            Algorithm::Sha256 => DigestEngine::Sha256(Sha256::new()),
            Algorithm::Sha384 => DigestEngine::Sha384(Sha384::new()),
            Algorithm::Sha512 => DigestEngine::Sha512(Sha512::new()),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            DigestEngine::Md5(_) => Algorithm::Md5,
            DigestEngine::Sha224(_) => Algorithm::Sha224,
            DigestEngine::Sha256(_) => Algorithm::Sha256,
            DigestEngine::Sha384(_) => Algorithm::Sha384,
            DigestEngine::Sha512(_) => Algorithm::Sha512,
        }
    }

    /// Feed bytes into the accumulator.
    pub fn update(&mut self, bytes: &[u8]) {
        match self {
            DigestEngine::Md5(ctx) => ctx.consume(bytes),
            DigestEngine::Sha224(h) => h.update(bytes),
            DigestEngine::Sha256(h) => h.update(bytes),
            DigestEngine::Sha384(h) => h.update(bytes),
            DigestEngine::Sha512(h) => h.update(bytes),
        }
    }

    /// Digest of everything fed so far, leaving the accumulator usable.
    pub fn snapshot_hex(&self) -> String {
        self.clone().finalize_hex()
    }

    /// Consume the accumulator and return its uppercase hex digest.
    pub fn finalize_hex(self) -> String {
        match self {
            DigestEngine::Md5(ctx) => hex::encode_upper(ctx.compute().0),
            DigestEngine::Sha224(h) => hex::encode_upper(h.finalize()),
            DigestEngine::Sha256(h) => hex::encode_upper(h.finalize()),
            DigestEngine::Sha384(h) => hex::encode_upper(h.finalize()),
            DigestEngine::Sha512(h) => hex::encode_upper(h.finalize()),
        }
    }
}

impl fmt::Debug for DigestEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DigestEngine").field(&self.algorithm()).finish()
    }
}

/// Hash a complete byte slice in one call.
pub fn hash_bytes(algorithm: Algorithm, data: &[u8]) -> String {
    let mut engine = DigestEngine::new(algorithm);
    engine.update(data);
    engine.finalize_hex()
}

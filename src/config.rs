//! Configuration System
//!
//! Layered configuration for hashing and logging. Values merge from built-in
//! defaults, the global config file, the workspace config file, and
//! `FSDIGEST_*` environment variables, in increasing order of precedence.

use crate::digest::Algorithm;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

mod facade;
mod merge {
    pub mod merge_policy;
}
mod sources {
    pub mod global_file;
    pub mod workspace_file;
}

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FsDigestConfig {
    /// Hashing and admission settings
    #[serde(default)]
    pub hashing: HashingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Hashing and admission-controller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashingConfig {
    /// Algorithm used when the caller does not name one
    #[serde(default = "default_algorithm")]
    pub default_algorithm: String,

    /// Fixed delay between processing steps while requests are queued (ms)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Open attempts allowed under descriptor exhaustion (None = unbounded)
    #[serde(default)]
    pub max_open_attempts: Option<u32>,

    /// Read chunk size for file streams (bytes)
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

pub(crate) fn default_algorithm() -> String {
    Algorithm::default().name().to_string()
}

pub(crate) fn default_retry_delay_ms() -> u64 {
    20
}

pub(crate) fn default_read_buffer_size() -> usize {
    64 * 1024
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            default_algorithm: default_algorithm(),
            retry_delay_ms: default_retry_delay_ms(),
            max_open_attempts: None,
            read_buffer_size: default_read_buffer_size(),
        }
    }
}

impl HashingConfig {
    /// Validate hashing configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_algorithm.parse::<Algorithm>().is_err() {
            return Err(format!(
                "Unknown default algorithm '{}'",
                self.default_algorithm
            ));
        }
        if self.retry_delay_ms == 0 {
            return Err("Retry delay must be greater than zero".to_string());
        }
        if self.max_open_attempts == Some(0) {
            return Err("max_open_attempts must be at least 1 when set".to_string());
        }
        if self.read_buffer_size == 0 {
            return Err("Read buffer size cannot be zero".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Hashing(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Hashing(msg) => write!(f, "Hashing: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl FsDigestConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.hashing.validate() {
            errors.push(ValidationError::Hashing(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

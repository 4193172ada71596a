//! Merge rules: defaults, override order, conflict handling.

use super::super::{default_algorithm, default_read_buffer_size, default_retry_delay_ms};
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("hashing.default_algorithm", default_algorithm())?
        .set_default("hashing.retry_delay_ms", default_retry_delay_ms())?
        .set_default("hashing.read_buffer_size", default_read_buffer_size() as u64)
}

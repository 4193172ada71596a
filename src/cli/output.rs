//! CLI output: error mapping from domain errors to the CLI surface.

use crate::error::DigestError;

/// Map domain errors to a one-line message for stderr.
pub fn map_error(e: &DigestError) -> String {
    match e {
        DigestError::Config(msg) => format!("configuration error: {}", msg),
        DigestError::InvalidArgument(msg) => msg.clone(),
        other => other.to_string(),
    }
}

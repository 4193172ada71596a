//! CLI domain: parse, route, output, and presentation only.
//! Digest work is delegated to `DigestTree`.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{format_duplicates_json, format_duplicates_text};
pub use route::RunContext;

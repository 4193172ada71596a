//! CLI parse: clap types for fsdigest. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// fsdigest - content digests for files, directory trees, and path batches
#[derive(Parser, Debug)]
#[command(name = "fsdigest")]
#[command(version)]
#[command(about = "Order-independent content digests and duplicate detection")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root; relative paths and fsdigest.toml resolve against it
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the digest of a file, directory, or batch of paths
    Hash {
        /// One path, or several to hash as a batch
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// md5, sha224, sha256, sha384, or sha512 (default from config)
        #[arg(long, short = 'a')]
        algorithm: Option<String>,
    },
    /// Print the semicolon-delimited report for every node
    Report {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long, short = 'a')]
        algorithm: Option<String>,
    },
    /// List digests shared by two or more sources
    Duplicates {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long, short = 'a')]
        algorithm: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

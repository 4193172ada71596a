//! CLI route: run context and the single command dispatch table.

use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{format_duplicates_json, format_duplicates_text};
use crate::config::{ConfigLoader, FsDigestConfig};
use crate::error::DigestError;
use crate::facade::DigestTree;
use crate::tree::Source;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Runtime context for CLI execution: workspace root, merged config, tree.
pub struct RunContext {
    workspace_root: PathBuf,
    config: FsDigestConfig,
    tree: DigestTree,
}

impl RunContext {
    /// Load configuration (explicit file, or workspace layering) and create
    /// the digest tree it describes.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, DigestError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        if let Err(errors) = config.validate() {
            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(DigestError::Config(joined.join("; ")));
        }
        let tree = DigestTree::from_config(&config)?;
        debug!(workspace = %workspace_root.display(), "Run context ready");

        Ok(Self {
            workspace_root,
            config,
            tree,
        })
    }

    pub fn config(&self) -> &FsDigestConfig {
        &self.config
    }

    pub async fn execute(&self, command: &Commands) -> Result<String, DigestError> {
        match command {
            Commands::Hash { paths, algorithm } => {
                self.build(paths).await?;
                let digest = self.compute(algorithm.as_deref()).await?;
                if digest.is_empty() {
                    return Err(DigestError::InvalidArgument(
                        "no digest could be computed for the given paths".to_string(),
                    ));
                }
                Ok(digest)
            }
            Commands::Report { paths, algorithm } => {
                self.build(paths).await?;
                self.compute(algorithm.as_deref()).await?;
                let report = self.tree.report().await?;
                Ok(report.trim_end().to_string())
            }
            Commands::Duplicates {
                paths,
                algorithm,
                format,
            } => {
                self.build(paths).await?;
                self.compute(algorithm.as_deref()).await?;
                let duplicates = self.tree.find_duplicates().await?;
                info!(groups = duplicates.len(), "Duplicate scan complete");
                match format {
                    OutputFormat::Text => Ok(format_duplicates_text(&duplicates)),
                    OutputFormat::Json => format_duplicates_json(&duplicates),
                }
            }
            Commands::Config => toml::to_string_pretty(&self.config)
                .map(|s| s.trim_end().to_string())
                .map_err(|e| DigestError::Config(e.to_string())),
        }
    }

    async fn build(&self, paths: &[PathBuf]) -> Result<(), DigestError> {
        let source = source_for(&self.workspace_root, paths);
        if !self.tree.build(source.clone()).await? {
            return Err(DigestError::InvalidArgument(format!(
                "cannot build digest tree for {}",
                source
            )));
        }
        Ok(())
    }

    async fn compute(&self, algorithm: Option<&str>) -> Result<String, DigestError> {
        match algorithm {
            Some(name) => self.tree.compute(name).await,
            None => self.tree.compute_default().await,
        }
    }
}

/// One path builds a single node; several build a batch.
fn source_for(workspace_root: &Path, paths: &[PathBuf]) -> Source {
    let mut resolved: Vec<PathBuf> = paths
        .iter()
        .map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                workspace_root.join(p)
            }
        })
        .collect();
    if resolved.len() == 1 {
        Source::Path(resolved.remove(0))
    } else {
        Source::Batch(resolved)
    }
}

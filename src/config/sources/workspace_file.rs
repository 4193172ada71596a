//! Workspace config file source: <root>/fsdigest.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;

pub const WORKSPACE_CONFIG_FILE: &str = "fsdigest.toml";

/// Add the workspace config file to builder if present.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_path = workspace_root.join(WORKSPACE_CONFIG_FILE);
    if config_path.exists() {
        return Ok(builder.add_source(File::from(config_path.as_path()).required(false)));
    }
    Ok(builder)
}

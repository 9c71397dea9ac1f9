//! Initialize the configuration directory: create ~/.deskrelay and a default
//! config file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Create the config directory and a default `config.json` if they do not
/// exist. Tokens are expected from the environment, so the default file is an
/// empty object.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        let default_config = b"{}";
        std::fs::write(config_path, default_config)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    }

    Ok(config_dir.to_path_buf())
}

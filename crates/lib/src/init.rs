//! Initialize the configuration directory: create ~/.conduit, a default config and a sample route file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

static DEFAULT_CONFIG: &str = include_str!("../config/config.json");
static SAMPLE_ROUTES: &str = include_str!("../config/routes.yaml");

/// Create the config directory and default files if they do not exist.
/// - Creates the config directory (parent of config file path).
/// - Writes `config.json` from the default template if missing.
/// - Writes a sample `routes.yaml` next to it if missing (not enabled by the default config).
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        std::fs::write(config_path, DEFAULT_CONFIG)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    } else {
        log::debug!("config already exists at {}, skipping", config_path.display());
    }

    let routes = config_dir.join("routes.yaml");
    if !routes.exists() {
        std::fs::write(&routes, SAMPLE_ROUTES)
            .with_context(|| format!("writing sample routes to {}", routes.display()))?;
        log::info!("wrote sample routes to {}", routes.display());
    }

    Ok(config_dir.to_path_buf())
}

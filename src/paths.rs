//! Centralized path resolution for incant
//!
//! # Environment Variables
//!
//! - `INCANT_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/incant`)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `INCANT_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/incant` (if set)
//! 3. `~/.config/incant`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "INCANT_CONFIG_DIR";

/// File name of the default manifest
pub const MANIFEST_FILE: &str = "incant.toml";

/// Get the incant config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        let path = PathBuf::from(xdg_config).join("incant");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("incant");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Manifest to load: `--file` when given, else `<config_dir>/incant.toml`
pub fn manifest_path(file: Option<&str>) -> Result<PathBuf> {
    match file {
        Some(file) => Ok(expand(file)),
        None => Ok(config_dir()?.join(MANIFEST_FILE)),
    }
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as written.
///
/// # Examples
///
/// ```ignore
/// let home_path = paths::expand("~/backups/data.tar.gz");
/// let var_path = paths::expand("$BACKUP_DIR/data.tar.gz");
/// ```
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

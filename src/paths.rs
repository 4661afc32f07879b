//! Path resolution for sloth
//!
//! Everything sloth keeps lives in one base directory:
//!
//! - `sloth.toml` - configuration
//! - `sloth.db` - operation history
//!
//! # Environment Variables
//!
//! - `SLOTH_BASE_DIR` - Override the base directory (e.g., `~/dotfiles/sloth`)
//!
//! Without the override the base directory is `~/.sloth.d`.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Environment variable for base directory override
pub const ENV_BASE_DIR: &str = "SLOTH_BASE_DIR";

/// Name of the base directory under the home directory
const DEFAULT_DIR_NAME: &str = ".sloth.d";

/// Get the sloth base directory path
///
/// Priority:
/// 1. `SLOTH_BASE_DIR` env var
/// 2. `~/.sloth.d`
pub fn base_dir() -> Result<PathBuf> {
    base_dir_from(std::env::var(ENV_BASE_DIR).ok())
}

fn base_dir_from(override_dir: Option<String>) -> Result<PathBuf> {
    if let Some(dir) = override_dir.filter(|d| !d.trim().is_empty()) {
        let path = expand(&dir);
        log::debug!("Using base dir from {}: {}", ENV_BASE_DIR, path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(DEFAULT_DIR_NAME);
    log::debug!("Using default base dir: {}", path.display());
    Ok(path)
}

/// Create the base directory if needed and return it
pub fn ensure_base_dir() -> Result<PathBuf> {
    let dir = base_dir()?;
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create base directory: {}", dir.display()))?;
        log::debug!("Created base dir {}", dir.display());
    }
    Ok(dir)
}

/// Path of the configuration file
pub fn config_file() -> Result<PathBuf> {
    Ok(base_dir()?.join("sloth.toml"))
}

/// Path of the operation history database
pub fn db_file() -> Result<PathBuf> {
    Ok(base_dir()?.join("sloth.db"))
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_dir_override() {
        let result = base_dir_from(Some("/custom/sloth".to_string())).unwrap();
        assert_eq!(result, PathBuf::from("/custom/sloth"));
    }

    #[test]
    fn test_base_dir_override_with_tilde() {
        let home = dirs::home_dir().unwrap();
        let result = base_dir_from(Some("~/dotfiles/sloth".to_string())).unwrap();
        assert_eq!(result, home.join("dotfiles").join("sloth"));
    }

    #[test]
    fn test_base_dir_default() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(base_dir_from(None).unwrap(), home.join(".sloth.d"));
        assert_eq!(base_dir_from(Some("  ".to_string())).unwrap(), home.join(".sloth.d"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$SLOTH_NONEXISTENT_VAR_12345/file");
        assert_eq!(
            result,
            PathBuf::from("/path/$SLOTH_NONEXISTENT_VAR_12345/file")
        );
    }

    #[test]
    fn test_env_var_constant() {
        assert_eq!(ENV_BASE_DIR, "SLOTH_BASE_DIR");
    }
}

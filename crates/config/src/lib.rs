//! Configuration loading for gmailtools
//!
//! Provides utilities for resolving file locations and loading JSON
//! files from the shared config directory (~/.config/gmailtools/).
//!
//! Paths given on the command line or through environment variables go
//! through [`normalize_path`], which expands `~` and `$VAR` references.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Get the gmailtools config directory (~/.config/gmailtools/)
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("gmailtools"))
}

/// Get the path to a config file within the gmailtools config directory
pub fn config_path(filename: &str) -> Option<PathBuf> {
    config_dir().map(|p| p.join(filename))
}

/// Resolve a path from an environment variable, falling back to `default`.
///
/// Both the variable value and the default are normalized.
pub fn env_path(var: &str, default: &str) -> PathBuf {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => normalize_path(&value),
        _ => normalize_path(default),
    }
}

/// Expand a leading `~` and any `$VAR` / `${VAR}` references.
///
/// Unknown variables are left untouched.
pub fn normalize_path(path: &str) -> PathBuf {
    let vars = shellexpand::env_with_context_no_errors(path, |var| std::env::var(var).ok());
    PathBuf::from(shellexpand::tilde(vars.as_ref()).as_ref())
}

/// Load and parse a JSON file from an arbitrary path
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse file: {}", path.display()))
}

/// Save a value as pretty JSON at an arbitrary path, creating parent directories
pub fn save_json_file<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir() {
        let dir = config_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().ends_with("gmailtools"));
    }

    #[test]
    fn test_config_path() {
        let path = config_path("test.json").unwrap();
        assert!(path.ends_with("gmailtools/test.json"));
    }

    #[test]
    fn test_normalize_path_expands_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(normalize_path("~/token.json"), home.join("token.json"));
        assert_eq!(normalize_path("~"), home);
    }

    #[test]
    fn test_normalize_path_leaves_unknown_vars() {
        let path = normalize_path("/tmp/$GMAILTOOLS_SURELY_UNSET_VAR/x");
        assert_eq!(path, PathBuf::from("/tmp/$GMAILTOOLS_SURELY_UNSET_VAR/x"));
    }

    #[test]
    fn test_normalize_path_expands_known_vars() {
        let home = std::env::var("HOME").unwrap_or_default();
        if !home.is_empty() {
            assert_eq!(
                normalize_path("${HOME}/mail"),
                PathBuf::from(format!("{}/mail", home))
            );
        }
    }

    #[test]
    fn test_normalize_path_tilde_with_unknown_vars() {
        let home = dirs::home_dir().unwrap();
        let path = normalize_path("~/$GMAILTOOLS_SURELY_UNSET_VAR/${GMAILTOOLS_SURELY_UNSET_VAR}");
        assert_eq!(
            path,
            home.join("$GMAILTOOLS_SURELY_UNSET_VAR/${GMAILTOOLS_SURELY_UNSET_VAR}")
        );
    }

    #[test]
    fn test_env_path_default() {
        let path = env_path("GMAILTOOLS_SURELY_UNSET_PATH", "/etc/creds.json");
        assert_eq!(path, PathBuf::from("/etc/creds.json"));
    }

    #[test]
    fn test_json_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/value.json");
        save_json_file(&path, &vec!["a", "b"]).unwrap();
        let loaded: Vec<String> = load_json_file(&path).unwrap();
        assert_eq!(loaded, vec!["a".to_string(), "b".to_string()]);
    }
}

// src/core/paths.rs

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to expand a user path.
#[derive(Error, Debug)]
pub enum PathError {
    /// An environment variable in the path is unset or invalid.
    #[error("Could not expand path '{path}': {reason}")]
    Expansion {
        /// The path as given.
        path: String,
        /// What the expansion reported.
        reason: String,
    },
}

/// Returns the per-tool configuration file: `<home>/.<tool-name>`.
pub fn tool_config_path(home_dir: &Path, tool_name: &str) -> PathBuf {
    home_dir.join(format!(".{}", tool_name))
}

/// Expands a user-supplied path, resolving the home directory (`~`) and
/// environment variables (`$VAR`).
pub fn expand_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(raw).map_err(|e| PathError::Expansion {
        path: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

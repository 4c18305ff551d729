//! # Tool Configuration File
//!
//! Loads the per-tool configuration file (`~/.<tool-name>`) into a
//! [`PropertyTree`] so it can be layered under the command-line options.
//!
//! The file is TOML. Scalars become leaves at depth 1, tables become named
//! sub-trees and arrays become comma-separated values. Booleans behave like
//! command-line flags: `quiet = true` sets `quiet`, `quiet = false` leaves it
//! unset. TOML keys are unique
//! per table, so the (sorted) order of the entries carries no priority.
use crate::core::property::PropertyTree;
use std::{fs, io, path::Path};
use thiserror::Error;
use toml::{Table, Value};

/// Failures loading a config file that exists.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Could not read config file '{path}': {source}")]
    Read {
        /// The config file.
        path: String,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },
    /// The file is not valid TOML.
    #[error("Config file '{path}' is not valid TOML: {source}")]
    Parse {
        /// The config file.
        path: String,
        /// The parser diagnostic.
        #[source]
        source: toml::de::Error,
    },
}

/// Loads the config file at `path`.
///
/// A missing file is not an error: it simply yields `None`.
pub fn load_config_file(path: &Path) -> Result<Option<PropertyTree>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("No config file at '{}'.", path.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            });
        }
    };

    let table: Table = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    log::debug!(
        "Loaded {} top-level entries from config file '{}'.",
        table.len(),
        path.display()
    );
    Ok(Some(table_to_tree(&table)))
}

fn table_to_tree(table: &Table) -> PropertyTree {
    let mut tree = PropertyTree::new();
    for (key, value) in table {
        match value {
            Value::Table(nested) => {
                tree.add_tree(1, key.as_str(), table_to_tree(nested));
            }
            // Flags are tested by presence: `true` is an empty leaf, `false` is absent.
            Value::Boolean(true) => {
                tree.add(1, key.as_str(), "");
            }
            Value::Boolean(false) => {}
            other => {
                tree.add(1, key.as_str(), scalar_text(other));
            }
        }
    }
    tree
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(d) => d.to_string(),
        Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(","),
        Value::Table(nested) => nested.to_string(),
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn test_missing_file_yields_none() {
        let dir = tempdir().unwrap();
        let result = load_config_file(&dir.path().join(".absent")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_scalars_tables_and_arrays_are_converted() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "nb-cores = 4\nprefix = \"run.\"\nverbose = true\nquiet = false\nkmers = [21, 31]\n\n[assembly]\nmin-abundance = 3\n"
        )
        .unwrap();
        file.flush().unwrap();

        let tree = load_config_file(file.path()).unwrap().unwrap();

        assert_eq!(tree.get_int("nb-cores").unwrap(), 4);
        assert_eq!(tree.get_str("prefix").unwrap(), "run.");
        assert_eq!(tree.get_str("verbose").unwrap(), "");
        assert!(!tree.contains("quiet"));
        assert_eq!(tree.get_str("kmers").unwrap(), "21,31");
        assert!(tree.get("assembly").and_then(|p| p.tree()).is_some());
        assert_eq!(tree.get_int("min-abundance").unwrap(), 3);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "this is = = not toml").unwrap();
        file.flush().unwrap();

        let result = load_config_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}

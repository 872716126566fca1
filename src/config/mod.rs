//! Configuration system for fieldquill.
//!
//! Settings are read from `~/.config/fieldquill/config.toml` (or a file
//! given with `--config`). Every field has a default, so a partial file or
//! no file at all is fine.
//!
//! # Example
//!
//! ```
//! use fieldquill::config::Config;
//!
//! let config = Config::default();
//! assert_eq!(config.indent_size, 2);
//! assert_eq!(config.log_level, "warn");
//!
//! let custom = Config {
//!     indent_size: 4,
//!     json_floats_as_decimal: true,
//!     ..Config::default()
//! };
//! assert!(custom.json_floats_as_decimal);
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::json::JsonParseOptions;
use crate::writer::WriterOptions;
use crate::xml::NamespaceTable;

/// Configuration for fieldquill.
///
/// # Fields
///
/// * `indent_size` - Spaces per indentation level in JSON and XML output (default: 2)
/// * `create_backup` - Create .bak files before overwriting (default: false)
/// * `log_level` - Default tracing filter when `RUST_LOG` is unset (default: "warn")
/// * `json_floats_as_decimal` - Read fractional JSON numbers as DECIMAL (default: false)
/// * `write_null_leaves` - Write explicit nulls for null values (default: false)
/// * `compress_output` - Gzip output even without a `.gz` name (default: false)
/// * `xml_namespaces` - Namespace alias to URI table (default: empty)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of spaces per indentation level
    #[serde(default = "default_indent_size")]
    pub indent_size: usize,

    /// Create .bak files before saving
    #[serde(default)]
    pub create_backup: bool,

    /// Tracing filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Classify fractional JSON numbers as DECIMAL instead of DOUBLE
    #[serde(default)]
    pub json_floats_as_decimal: bool,

    /// Write explicit null leaves instead of skipping null values
    #[serde(default)]
    pub write_null_leaves: bool,

    /// Gzip output regardless of file name
    #[serde(default)]
    pub compress_output: bool,

    /// XML namespace aliases, alias -> URI
    #[serde(default)]
    pub xml_namespaces: NamespaceTable,
}

/// Returns the default indentation size.
fn default_indent_size() -> usize {
    2
}

/// Returns the default log level.
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent_size: default_indent_size(),
            create_backup: false,
            log_level: default_log_level(),
            json_floats_as_decimal: false,
            write_null_leaves: false,
            compress_output: false,
            xml_namespaces: NamespaceTable::new(),
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/fieldquill/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("fieldquill");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        let config_path = match Self::config_path() {
            Some(path) => path,
            None => return Self::default(),
        };

        if !config_path.exists() {
            return Self::default();
        }

        Self::load_from(&config_path).unwrap_or_else(|err| {
            tracing::warn!(path = %config_path.display(), "ignoring config file: {:#}", err);
            Self::default()
        })
    }

    /// Loads configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid configuration TOML.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Saves configuration to the default config file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&config_path)
    }

    /// Saves configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    pub fn json_options(&self) -> JsonParseOptions {
        JsonParseOptions {
            floats_as_decimal: self.json_floats_as_decimal,
        }
    }

    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            write_null_leaves: self.write_null_leaves,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("indent_size = 4").unwrap();
        assert_eq!(config.indent_size, 4);
        assert_eq!(config.log_level, "warn");
        assert!(config.xml_namespaces.is_empty());
    }

    #[test]
    fn test_namespace_table() {
        let config: Config = toml::from_str(
            r#"
            [xml_namespaces]
            ord = "urn:example:orders"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.xml_namespaces.get("ord").map(String::as_str),
            Some("urn:example:orders")
        );
    }
}

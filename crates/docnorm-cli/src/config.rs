//! Configuration file support (`.docnorm.toml`)
//!
//! Configuration files can be placed in:
//! - User home directory: `~/.docnorm.toml` (user defaults)
//! - Working directory: `./.docnorm.toml` (project defaults)
//! - Custom location via `--config` (replaces both)
//!
//! Precedence order (highest to lowest):
//! 1. Command-line arguments
//! 2. Project config
//! 3. User config
//! 4. Built-in defaults

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the home and working directories
pub const CONFIG_FILE_NAME: &str = ".docnorm.toml";

/// Top-level structure of `.docnorm.toml`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for the `normalize` and `batch` commands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalize: Option<NormalizeConfig>,
}

/// `[normalize]` section
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Reading order (`page` or `preserve`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,

    /// Separator used when flattening body text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,

    /// Output format (`json` or `yaml`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Compact JSON output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compact: Option<bool>,

    /// Top-level document fields to emit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<String>>,

    /// Extra roles that may be bucketed as `other` without a warning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_ignored: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find and load configuration files.
    /// Returns (`user_config`, `project_config`)
    #[must_use]
    pub fn discover_configs() -> (Option<Self>, Option<Self>) {
        let user_config =
            dirs::home_dir().and_then(|home| Self::load_optional(&home.join(CONFIG_FILE_NAME)));
        let project_config = Self::load_optional(&PathBuf::from(CONFIG_FILE_NAME));
        (user_config, project_config)
    }

    /// Load a config file if it exists; a broken file is reported and skipped.
    fn load_optional(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("{} {e:#}", "Warning:".yellow().bold());
                None
            }
        }
    }

    /// Merge configs with precedence project > user > defaults
    #[must_use]
    pub fn merge(user_config: Option<Self>, project_config: Option<Self>) -> Self {
        let mut merged = Self::default();

        if let Some(user) = user_config {
            merged.normalize = user.normalize;
        }

        if let Some(project) = project_config {
            if let Some(normalize) = project.normalize {
                let mut current = merged.normalize.unwrap_or_default();
                if let Some(order) = normalize.order {
                    current.order = Some(order);
                }
                if let Some(separator) = normalize.separator {
                    current.separator = Some(separator);
                }
                if let Some(format) = normalize.format {
                    current.format = Some(format);
                }
                if let Some(compact) = normalize.compact {
                    current.compact = Some(compact);
                }
                if let Some(filters) = normalize.filters {
                    current.filters = Some(filters);
                }
                if let Some(extra_ignored) = normalize.extra_ignored {
                    current.extra_ignored = Some(extra_ignored);
                }
                merged.normalize = Some(current);
            }
        }

        merged
    }

    /// The `[normalize]` section, or an empty one
    #[must_use]
    pub fn normalize_section(&self) -> NormalizeConfig {
        self.normalize.clone().unwrap_or_default()
    }
}

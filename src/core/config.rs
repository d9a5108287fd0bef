//! Run configuration with documented defaults
//!
//! The defaults reproduce the layout the balance mod ships with, so a run
//! with no config file behaves exactly like the in-game patcher.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::error::{BalanceError, Result};

/// How forgiving the change-document parser is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Mistyped literals read as null and trailing text is ignored.
    #[default]
    Lenient,
    /// Mistyped literals and trailing text are parse errors.
    Strict,
}

/// Configuration for one balance run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    // === CHANGE DOCUMENT ===
    /// File name searched for when no explicit path is given
    pub change_file_name: String,

    /// Location of the change document relative to the host root
    ///
    /// Checked first, before any recursive search.
    pub plugin_relative_dir: PathBuf,

    /// Root directory of the host installation
    ///
    /// When unset, only the working-directory search runs.
    pub host_root: Option<PathBuf>,

    /// Whether to fall back to a recursive search of the working directory
    pub search_working_dir: bool,

    /// Parser strictness for the change document
    pub parse_mode: ParseMode,

    // === DISCOVERY ===
    /// Field every card-like record exposes with its human-readable name
    pub display_name_field: String,

    /// Second field required before a record shape counts as card-like
    pub cost_field: String,

    /// Substring (case-insensitive) identifying static card collections
    pub collection_hint: String,

    /// Base kind scanned when no static collection yields candidates
    pub live_instance_kind: String,

    // === MUTATION ===
    /// Apply the hard-coded per-card overrides after generic writes
    pub special_cases: bool,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            change_file_name: "balance_changes.json".to_string(),
            plugin_relative_dir: PathBuf::from("plugins/UnofficialBalanceV1/mod/config"),
            host_root: None,
            search_working_dir: true,
            parse_mode: ParseMode::Lenient,

            display_name_field: "DisplayName".to_string(),
            cost_field: "Cost".to_string(),
            collection_hint: "cards".to_string(),
            live_instance_kind: "ScriptableObject".to_string(),

            special_cases: true,
        }
    }
}

impl BalanceConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML config; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: BalanceConfig = toml::from_str(content)?;
        config.validate().map_err(BalanceError::InvalidConfig)?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.change_file_name.trim().is_empty() {
            return Err("change_file_name must not be empty".into());
        }

        let required = [
            ("display_name_field", &self.display_name_field),
            ("cost_field", &self.cost_field),
            ("collection_hint", &self.collection_hint),
            ("live_instance_kind", &self.live_instance_kind),
        ];
        for (key, value) in required {
            if value.is_empty() {
                return Err(format!("{} must not be empty", key));
            }
        }

        if self.plugin_relative_dir.is_absolute() {
            return Err(format!(
                "plugin_relative_dir ({}) must be relative to host_root",
                self.plugin_relative_dir.display()
            ));
        }

        Ok(())
    }
}

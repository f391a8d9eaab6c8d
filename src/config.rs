//! Configuration for validation runs
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (jsl.toml)
//! - Environment variables (JSL__*)
//!
//! ## Example config file (jsl.toml):
//! ```toml
//! [validator]
//! max_errors = 100
//! max_depth = 64
//! strict_instance_semantics = true
//!
//! [output]
//! format = "compact"
//! sort_errors = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::validator::ValidatorConfig;

/// Depth limit applied when no configuration sets one. Schemas handed to the
/// command line are untrusted, so the unbounded library default is not used.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JslConfig {
    /// Validator knobs
    #[serde(default = "default_validator")]
    pub validator: ValidatorConfig,

    /// Report settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Report output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Sort errors canonically before printing
    #[serde(default = "default_true")]
    pub sort_errors: bool,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_validator() -> ValidatorConfig {
    ValidatorConfig::default().with_max_depth(DEFAULT_MAX_DEPTH)
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Pretty,
            sort_errors: true,
        }
    }
}

impl Default for JslConfig {
    fn default() -> Self {
        Self {
            validator: default_validator(),
            output: OutputConfig::default(),
        }
    }
}

impl JslConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering `config_path` (if given) over the
    /// default locations. Environment variables win over every file.
    pub fn load_from(config_path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["jsl.toml", ".jsl.toml", "config/jsl.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "jsl", "jsl") {
            let xdg_config = dirs.config_dir().join("jsl.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("JSL")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

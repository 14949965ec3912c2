//! Configuration system for respdiff.
//!
//! Settings are read from `~/.config/respdiff/config.toml`. Every field has a
//! default, so a partial file (or no file at all) is fine. Command-line flags
//! override whatever is loaded here.
//!
//! # Example
//!
//! ```
//! use respdiff::config::{Config, OutputFormat};
//!
//! let config = Config::default();
//! assert_eq!(config.output_format, OutputFormat::Json);
//! assert!(config.pretty);
//!
//! let custom = Config {
//!     output_format: OutputFormat::Yaml,
//!     ignore: vec!["meta/request_id".to_string()],
//!     ..Config::default()
//! };
//! assert_eq!(custom.ignore.len(), 1);
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How results are written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Configuration for respdiff.
///
/// # Fields
///
/// * `output_format` - `json` or `yaml` (default: json)
/// * `pretty` - Indent output (default: true)
/// * `preserve_indices` - Show partially rebuilt sequences as index maps (default: false)
/// * `log_level` - Filter used when `RUST_LOG` is unset (default: "warn")
/// * `max_input_bytes` - Inputs larger than this are refused before any path runs (default: 100MB)
/// * `only` - Paths selected on every run
/// * `ignore` - Paths deleted on every run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Output format for results
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Indent output
    #[serde(default = "default_pretty")]
    pub pretty: bool,

    /// Show partially rebuilt sequences as index maps
    #[serde(default)]
    pub preserve_indices: bool,

    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Largest input accepted, in bytes
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: u64,

    /// Paths selected on every run
    #[serde(default)]
    pub only: Vec<String>,

    /// Paths deleted on every run
    #[serde(default)]
    pub ignore: Vec<String>,
}

fn default_pretty() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// 100MB
fn default_max_input_bytes() -> u64 {
    104_857_600
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            pretty: default_pretty(),
            preserve_indices: false,
            log_level: default_log_level(),
            max_input_bytes: default_max_input_bytes(),
            only: Vec::new(),
            ignore: Vec::new(),
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/respdiff/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("respdiff");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable config");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Loads configuration from `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Saves configuration to `path`, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }
}

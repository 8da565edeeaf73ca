//! Configuration management for the dataset pipeline
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (countrykit.toml)
//! - Environment variables (COUNTRYKIT__*)
//!
//! ## Example config file (countrykit.toml):
//! ```toml
//! [data]
//! dir = "./data"
//!
//! [generate]
//! output_format = "pretty"
//! write_checksums = true
//!
//! [merge]
//! source_url = "https://raw.githubusercontent.com/mledoze/countries/master/countries.json"
//!
//! [flags]
//! dir = "./flags"
//! base_url = "https://flagcdn.com/"
//! batch_size = 5
//! batch_pause_ms = 100
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KitConfig {
    /// Data directory settings
    #[serde(default)]
    pub data: DataConfig,

    /// Generation settings
    #[serde(default)]
    pub generate: GenerateConfig,

    /// Merge settings
    #[serde(default)]
    pub merge: MergeConfig,

    /// Flag download settings
    #[serde(default)]
    pub flags: FlagsConfig,
}

/// Where the canonical list and derived artifacts live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Output format for derived artifacts (pretty or compact)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// Write checksums.sha256 next to the artifacts
    #[serde(default = "default_true")]
    pub write_checksums: bool,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

/// Merge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Endpoint returning a JSON array of external country records
    #[serde(default = "default_source_url")]
    pub source_url: String,
}

/// Flag download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagsConfig {
    /// Cache directory for downloaded SVGs
    #[serde(default = "default_flags_dir")]
    pub dir: PathBuf,

    /// Base URL; `<cca2 lower>.svg` is appended
    #[serde(default = "default_flags_base_url")]
    pub base_url: String,

    /// Number of downloads in flight at once
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches in milliseconds
    #[serde(default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_true() -> bool {
    true
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Pretty
}

fn default_source_url() -> String {
    "https://raw.githubusercontent.com/mledoze/countries/master/countries.json".to_string()
}

fn default_flags_dir() -> PathBuf {
    PathBuf::from("flags")
}

fn default_flags_base_url() -> String {
    "https://flagcdn.com/".to_string()
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_pause_ms() -> u64 {
    100
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Pretty,
            write_checksums: true,
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
        }
    }
}

impl Default for FlagsConfig {
    fn default() -> Self {
        Self {
            dir: default_flags_dir(),
            base_url: default_flags_base_url(),
            batch_size: default_batch_size(),
            batch_pause_ms: default_batch_pause_ms(),
        }
    }
}

impl KitConfig {
    /// Load configuration from the default locations, with an optional
    /// explicit file layered on top
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "countrykit.toml",
            ".countrykit.toml",
            "config/countrykit.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "countrykit") {
            let xdg_config = config_dir.config_dir().join("countrykit.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // COUNTRYKIT__DATA__DIR=... overrides [data] dir
        builder = builder.add_source(
            Environment::with_prefix("COUNTRYKIT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Data directory, resolved against the current directory when relative
    pub fn data_dir(&self) -> PathBuf {
        resolve(&self.data.dir)
    }

    /// Flag cache directory, resolved against the current directory when relative
    pub fn flags_dir(&self) -> PathBuf {
        resolve(&self.flags.dir)
    }
}

fn resolve(path: &PathBuf) -> PathBuf {
    if path.is_absolute() {
        path.clone()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KitConfig::default();
        assert_eq!(config.flags.batch_size, 5);
        assert_eq!(config.flags.batch_pause_ms, 100);
        assert_eq!(config.generate.output_format, OutputFormat::Pretty);
        assert!(config.generate.write_checksums);
    }

    #[test]
    fn test_serialize_config() {
        let config = KitConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[flags]"));
        assert!(toml_str.contains("output_format = \"pretty\""));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: KitConfig = toml::from_str("[generate]\noutput_format = \"compact\"\n").unwrap();
        assert_eq!(config.generate.output_format, OutputFormat::Compact);
        assert!(config.generate.write_checksums);
        assert_eq!(config.data.dir, PathBuf::from("data"));
    }
}

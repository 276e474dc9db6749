//! Configuration for schema storage
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schemas.toml)
//! - Environment variables (LIVE_SCHEMAS__*)
//!
//! ## Example config file (schemas.toml):
//! ```toml
//! [storage]
//! schema_volume_path = "./schemas"
//! import_schema_path = "./schemas/import"
//! export_schema_path = "./schemas/export"
//!
//! [export]
//! output_format = "pretty"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Where schemas live
    #[serde(default)]
    pub storage: VolumeConfig,

    /// How schema files are written
    #[serde(default)]
    pub export: ExportConfig,
}

/// Schema folders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Folder holding the persisted schemas
    #[serde(default = "default_volume_path")]
    pub schema_volume_path: PathBuf,

    /// Folder with import schemas used to seed and update stored schemas
    #[serde(default)]
    pub import_schema_path: Option<PathBuf>,

    /// Folder that receives a copy of every saved schema
    #[serde(default)]
    pub export_schema_path: Option<PathBuf>,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExportConfig {
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_volume_path() -> PathBuf {
    PathBuf::from("schemas")
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            schema_volume_path: default_volume_path(),
            import_schema_path: None,
            export_schema_path: None,
        }
    }
}

impl StorageConfig {
    /// Configuration rooted at a single volume folder
    pub fn with_volume(path: impl Into<PathBuf>) -> Self {
        Self {
            storage: VolumeConfig {
                schema_volume_path: path.into(),
                ..VolumeConfig::default()
            },
            export: ExportConfig::default(),
        }
    }

    pub fn import_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage.import_schema_path = Some(path.into());
        self
    }

    pub fn export_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage.export_schema_path = Some(path.into());
        self
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, with an optional explicit file layered on top
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = [
            "schemas.toml",
            ".schemas.toml",
            "config/schemas.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "live-schemas") {
            let xdg_config = config_dir.config_dir().join("schemas.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("LIVE_SCHEMAS")
                .separator("__")
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

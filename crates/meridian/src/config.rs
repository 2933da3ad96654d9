//! Application configuration loaded from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use world_core::SECTOR_WIDTH;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub world: WorldSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSettings {
    /// Directory holding the terrain and statics data files.
    pub data_dir: String,
    /// TOML file with the static region definitions.
    pub regions_file: String,
    /// TOML file with land-tile and item-model flag assignments.
    pub models_file: String,
    /// Terrain source kind: "flat" or "files".
    pub terrain: String,
    /// One entry per plane, in plane-id order.
    pub planes: Vec<PlaneSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaneSettings {
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub json_format: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            world: WorldSettings {
                data_dir: "data".to_string(),
                regions_file: "data/regions.toml".to_string(),
                models_file: "data/models.toml".to_string(),
                terrain: "flat".to_string(),
                planes: vec![PlaneSettings { width: 768, height: 512 }],
            },
            logging: LoggingSettings { level: "info".to_string(), json_format: false },
        }
    }
}

impl AppConfig {
    /// Loads the configuration, writing a default file first when none
    /// exists yet.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.world.planes.is_empty() {
            return Err("At least one plane must be configured".to_string());
        }
        for (plane, spec) in self.world.planes.iter().enumerate() {
            if spec.width == 0 || spec.height == 0 {
                return Err(format!("Plane {plane} has zero dimensions"));
            }
            if spec.width % SECTOR_WIDTH != 0 || spec.height % SECTOR_WIDTH != 0 {
                return Err(format!(
                    "Plane {plane} dimensions must be multiples of {SECTOR_WIDTH}"
                ));
            }
        }

        match self.world.terrain.as_str() {
            "flat" | "files" => {}
            other => return Err(format!("Unknown terrain source kind: {other}")),
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn validation_catches_bad_settings() {
        let mut config = AppConfig::default();
        config.world.planes[0].width = 100; // not a multiple of 16
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.world.planes.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.world.terrain = "procedural".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.logging.level, "info");

        // A second load reads the file it just wrote.
        let reread = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reread.world.planes.len(), config.world.planes.len());
    }
}

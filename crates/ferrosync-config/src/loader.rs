//! Configuration loader utilities

use crate::{Config, ConfigBuilder, ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// Prefix for environment variable overrides, e.g. `FERROSYNC__SYNC__CHUNK_SIZE`
pub const ENV_PREFIX: &str = "FERROSYNC";

/// Configuration loader with common loading patterns
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the first file found in the default locations
    pub fn load_default() -> ConfigResult<Config> {
        let mut builder = ConfigBuilder::new().add_defaults();

        if let Some(path) = Self::config_exists() {
            builder = builder.add_source_file(path);
        }

        builder.add_env_prefix(ENV_PREFIX).build()
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Configuration file not found",
                ),
            });
        }

        ConfigBuilder::new()
            .add_defaults()
            .add_source_file(path)
            .add_env_prefix(ENV_PREFIX)
            .build()
    }

    /// Save configuration to a file, format chosen by extension
    pub fn save_to_file<P: AsRef<Path>>(config: &Config, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        ConfigBuilder::validate(config)?;

        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                toml::to_string_pretty(config).map_err(|e| ConfigError::Serialization {
                    message: format!("Failed to serialize to TOML: {}", e),
                })?
            }
            Some("json") => {
                serde_json::to_string_pretty(config).map_err(|e| ConfigError::Serialization {
                    message: format!("Failed to serialize to JSON: {}", e),
                })?
            }
            _ => serde_yaml::to_string(config)?,
        };

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> ConfigResult<()> {
        Self::save_to_file(&Config::default(), path)
    }

    /// Default configuration file paths in order of preference
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("ferrosync.yaml"),
            PathBuf::from("ferrosync.yml"),
            PathBuf::from("ferrosync.toml"),
            PathBuf::from(".ferrosync.yaml"),
            PathBuf::from(".ferrosync.yml"),
            PathBuf::from(".ferrosync.toml"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let app_dir = config_dir.join("ferrosync");
            paths.push(app_dir.join("config.yaml"));
            paths.push(app_dir.join("config.yml"));
            paths.push(app_dir.join("config.toml"));
        }

        paths
    }

    /// First existing configuration file in the default locations
    pub fn config_exists() -> Option<PathBuf> {
        Self::default_config_paths()
            .into_iter()
            .find(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_paths_include_user_config_dir() {
        let paths = ConfigLoader::default_config_paths();

        assert_eq!(paths[0], PathBuf::from("ferrosync.yaml"));
        if let Some(config_dir) = dirs::config_dir() {
            let app_dir = config_dir.join("ferrosync");
            assert!(paths.contains(&app_dir.join("config.yaml")));
            assert!(paths.contains(&app_dir.join("config.toml")));
            assert!(paths[6..].iter().all(|path| path.is_absolute()));
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConfigLoader::load_from_file("/nonexistent/ferrosync.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_save_and_load_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.yaml");

        let mut original = Config::default();
        original.sync.index_file = ".published".to_string();
        ConfigLoader::save_to_file(&original, &config_path).unwrap();

        let loaded = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.sync.index_file, ".published");
        assert_eq!(loaded.sync.chunk_size, original.sync.chunk_size);
    }

    #[test]
    fn test_save_and_load_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let original = Config::default();
        ConfigLoader::save_to_file(&original, &config_path).unwrap();

        let loaded = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.transfer, original.transfer);
    }

    #[test]
    fn test_save_and_load_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.json");

        ConfigLoader::generate_default_config(&config_path).unwrap();
        let loaded = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.logging, Config::default().logging);
    }

    #[test]
    fn test_save_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.yaml");

        let mut config = Config::default();
        config.logging.level = "chatty".to_string();

        assert!(ConfigLoader::save_to_file(&config, &config_path).is_err());
        assert!(!config_path.exists());
    }
}

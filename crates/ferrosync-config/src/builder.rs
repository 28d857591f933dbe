//! Configuration builder for flexible configuration loading

use crate::{Config, ConfigError, ConfigResult};
use config::{ConfigBuilder as ConfigBuilderInner, Environment, File, FileFormat};
use ferrosync_types::{ChunkSize, Concurrency};
use std::path::{Path, PathBuf};

/// Configuration builder for loading configuration from multiple sources
#[derive(Debug)]
pub struct ConfigBuilder {
    inner: ConfigBuilderInner<config::builder::DefaultState>,
    sources: Vec<ConfigSource>,
    env_separator: String,
}

#[derive(Debug, Clone)]
enum ConfigSource {
    File { path: PathBuf, format: FileFormat },
    Defaults,
    Environment { prefix: String },
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            inner: config::Config::builder(),
            sources: Vec::new(),
            env_separator: "__".to_string(),
        }
    }

    /// Add default configuration values
    pub fn add_defaults(mut self) -> Self {
        self.sources.push(ConfigSource::Defaults);
        self
    }

    /// Add a configuration file source. Missing files are skipped.
    pub fn add_source_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = Self::detect_format(&path);
        self.sources.push(ConfigSource::File { path, format });
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.sources.push(ConfigSource::Environment {
            prefix: prefix.into(),
        });
        self
    }

    /// Set environment variable separator (default: "__")
    pub fn env_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.env_separator = separator.into();
        self
    }

    /// Build the configuration
    ///
    /// Sources are layered in the order they were added; later sources
    /// override earlier ones key by key.
    pub fn build(mut self) -> ConfigResult<Config> {
        for source in &self.sources {
            match source {
                ConfigSource::Defaults => {
                    let defaults = serde_yaml::to_value(Config::default()).map_err(|e| {
                        ConfigError::other(format!("Failed to serialize defaults: {}", e))
                    })?;
                    self.inner = self
                        .inner
                        .add_source(config::Config::try_from(&defaults)?);
                }
                ConfigSource::File { path, format } => {
                    if path.exists() {
                        self.inner = self
                            .inner
                            .add_source(File::from(path.clone()).format(*format));
                    }
                }
                ConfigSource::Environment { prefix } => {
                    self.inner = self.inner.add_source(
                        Environment::with_prefix(prefix)
                            .separator(&self.env_separator)
                            .try_parsing(true),
                    );
                }
            }
        }

        let config = self.inner.build()?;
        let result: Config = config.try_deserialize()?;

        Self::validate(&result)?;

        Ok(result)
    }

    /// Detect file format from extension
    fn detect_format(path: &Path) -> FileFormat {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("toml") => FileFormat::Toml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Yaml,
        }
    }

    /// Validate the configuration
    pub(crate) fn validate(config: &Config) -> ConfigResult<()> {
        ChunkSize::new(config.sync.chunk_size.get()).map_err(ConfigError::validation)?;
        Concurrency::new(config.sync.scan_concurrency.get()).map_err(ConfigError::validation)?;
        Concurrency::new(config.sync.transfer_concurrency.get())
            .map_err(ConfigError::validation)?;

        for (key, name) in [
            ("sync.index_file", &config.sync.index_file),
            ("sync.ignore_file", &config.sync.ignore_file),
        ] {
            if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains(':')
            {
                return Err(ConfigError::validation(format!(
                    "{} must be a plain file name, got '{}'",
                    key, name
                )));
            }
        }

        if config.sync.index_file == config.sync.ignore_file {
            return Err(ConfigError::validation(
                "Baseline and ignore files must have different names",
            ));
        }

        if config.transfer.connect_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "Connect timeout must be greater than 0",
            ));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&config.logging.level.as_str()) {
            return Err(ConfigError::validation(
                "Log level must be one of: trace, debug, info, warn, error",
            ));
        }

        Ok(())
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Configuration management infrastructure.
//!
//! Handler-wide settings that are not carried by the request itself: protocol
//! limits, the running client version, keystore defaults and the
//! prior-signature pre-check default.

use crate::domain::types::ClientVersion;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Highest protocol version understood by this handler
pub const DEFAULT_MAX_PROTOCOL_VERSION: u32 = 4;

/// Failures while reading, writing or validating the configuration file.
#[derive(Error, Debug, miette::Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    #[error("Invalid configuration value: {0}")]
    Invalid(String),

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Handler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfiguration {
    /// Highest protocol version accepted from callers
    pub max_protocol_version: u32,

    /// Version of the running client, compared against `minimumClientVersion`
    pub client_version: String,

    /// Keystore used when the request does not name one
    pub default_keystore: String,

    /// Run the prior-signature check when the request does not say otherwise
    pub check_signatures: bool,

    /// Accept storage/retrieve servlet URLs that point at loopback hosts
    pub allow_local_storage_urls: bool,

    /// Default log filter for the binary
    pub log_level: String,
}

impl Default for HandlerConfiguration {
    fn default() -> Self {
        Self {
            max_protocol_version: DEFAULT_MAX_PROTOCOL_VERSION,
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            default_keystore: "SYSTEM".to_string(),
            check_signatures: false,
            allow_local_storage_urls: false,
            log_level: "info".to_string(),
        }
    }
}

impl HandlerConfiguration {
    /// Parsed form of [`HandlerConfiguration::client_version`].
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when the version string is not dotted numeric.
    pub fn running_version(&self) -> ConfigResult<ClientVersion> {
        self.client_version
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("client_version '{}'", self.client_version)))
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("protocol-signer").join("config.toml")
        } else {
            PathBuf::from("protocol-signer-config.toml")
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create_default(&self) -> ConfigResult<HandlerConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = HandlerConfiguration::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load configuration from file
    pub fn load(&self) -> ConfigResult<HandlerConfiguration> {
        log::debug!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|source| ConfigError::Read {
            path: self.config_path.clone(),
            source,
        })?;

        let config: HandlerConfiguration =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &HandlerConfiguration) -> ConfigResult<()> {
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content =
            toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(&self.config_path, content).map_err(|source| ConfigError::Write {
            path: self.config_path.clone(),
            source,
        })
    }

    /// Update a specific configuration value
    pub fn update_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let mut config = self.load_or_create_default()?;

        match key {
            "max_protocol_version" => {
                config.max_protocol_version = value
                    .parse()
                    .map_err(|_| ConfigError::Invalid(format!("protocol version '{value}'")))?;
            }
            "client_version" => config.client_version = value.to_string(),
            "default_keystore" => config.default_keystore = value.to_string(),
            "check_signatures" => config.check_signatures = parse_bool(value)?,
            "allow_local_storage_urls" => config.allow_local_storage_urls = parse_bool(value)?,
            "log_level" => config.log_level = value.to_string(),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }

        validate_config(&config)?;
        self.save(&config)
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Export configuration as a portable format
    pub fn export_config(&self, format: ExportFormat) -> ConfigResult<String> {
        let config = self.load_or_create_default()?;

        match format {
            ExportFormat::Toml => toml::to_string_pretty(&config)
                .map_err(|e| ConfigError::Serialize(format!("TOML export failed: {e}"))),
            ExportFormat::Json => serde_json::to_string_pretty(&config)
                .map_err(|e| ConfigError::Serialize(format!("JSON export failed: {e}"))),
            ExportFormat::Yaml => serde_yaml::to_string(&config)
                .map_err(|e| ConfigError::Serialize(format!("YAML export failed: {e}"))),
        }
    }

    /// Import configuration from a string
    pub fn import_config(&self, content: &str, format: ExportFormat) -> ConfigResult<()> {
        let config: HandlerConfiguration = match format {
            ExportFormat::Toml => toml::from_str(content)
                .map_err(|e| ConfigError::Parse(format!("TOML import failed: {e}")))?,
            ExportFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::Parse(format!("JSON import failed: {e}")))?,
            ExportFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| ConfigError::Parse(format!("YAML import failed: {e}")))?,
        };

        validate_config(&config)?;
        self.save(&config)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration export/import formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Toml,
    Json,
    Yaml,
}

/// Validate configuration values
pub fn validate_config(config: &HandlerConfiguration) -> ConfigResult<()> {
    if config.max_protocol_version == 0 {
        return Err(ConfigError::Invalid(
            "max_protocol_version must be greater than 0".to_string(),
        ));
    }

    config.running_version()?;

    if config.default_keystore.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "default_keystore must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn parse_bool(value: &str) -> ConfigResult<bool> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("boolean '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_configuration() {
        let config = HandlerConfiguration::default();
        assert_eq!(config.max_protocol_version, DEFAULT_MAX_PROTOCOL_VERSION);
        assert!(!config.check_signatures);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = HandlerConfiguration::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: HandlerConfiguration = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: HandlerConfiguration = toml::from_str("check_signatures = true").unwrap();
        assert!(config.check_signatures);
        assert_eq!(config.max_protocol_version, DEFAULT_MAX_PROTOCOL_VERSION);
    }

    #[test]
    fn test_config_manager_with_temp_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(&config_path);

        let config = manager.load_or_create_default().unwrap();
        assert!(config_path.exists());

        let loaded = manager.load().unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_update_value() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));

        manager.update_value("max_protocol_version", "3").unwrap();
        manager.update_value("check_signatures", "true").unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.max_protocol_version, 3);
        assert!(config.check_signatures);

        assert!(matches!(
            manager.update_value("no_such_key", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            manager.update_value("max_protocol_version", "0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            manager.update_value("client_version", "one.two"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_export_import_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));
        manager.update_value("default_keystore", "PKCS12").unwrap();

        let json = manager.export_config(ExportFormat::Json).unwrap();
        assert!(json.contains("PKCS12"));

        let other = ConfigManager::with_path(temp_dir.path().join("other.toml"));
        other.import_config(&json, ExportFormat::Json).unwrap();
        assert_eq!(other.load().unwrap().default_keystore, "PKCS12");
    }
}

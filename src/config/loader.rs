// src/config/loader.rs
//! Layered configuration loader
//!
//! Built-in defaults, then an optional TOML file, then `BRAINWAVE_*`
//! environment overrides. Nested keys use a double underscore:
//! `BRAINWAVE_EEG__WINDOW_SIZE=128` sets `eeg.window_size`.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SystemConfig;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "BRAINWAVE";
/// Separator between the prefix and the first key
pub const ENV_PREFIX_SEPARATOR: &str = "_";
/// Separator between nested keys in environment variable names
pub const ENV_SEPARATOR: &str = "__";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The requested TOML file does not exist
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// File, environment or TOML error
    #[error("Configuration parse error: {0}")]
    Parse(String),

    /// Every violation found by `validate_consistency`
    #[error("Configuration validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Reading or writing a configuration file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Configuration loader
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    use_environment: bool,
}

impl ConfigLoader {
    /// Loader reading defaults plus environment overrides
    pub fn new() -> Self {
        Self {
            config_path: None,
            use_environment: true,
        }
    }

    /// Loader reading the given TOML file, which must exist
    pub fn with_file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: Some(path.as_ref().to_path_buf()),
            use_environment: true,
        }
    }

    /// Disable `BRAINWAVE_*` environment overrides
    pub fn without_environment(mut self) -> Self {
        self.use_environment = false;
        self
    }

    /// Load, merge and validate the configuration
    pub fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = &self.config_path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
        }

        if self.use_environment {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_PREFIX_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            );
        }

        let config: SystemConfig = builder.build()?.try_deserialize()?;
        config.validate_consistency().map_err(ConfigError::Validation)?;

        info!(
            "Configuration loaded: {} Hz EEG, window {} samples",
            config.eeg.sample_rate_hz, config.eeg.window_size
        );
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string, without environment overrides
    pub fn from_toml_str(content: &str) -> Result<SystemConfig, ConfigError> {
        let config: SystemConfig = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate_consistency().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Write a configuration as pretty TOML
    pub fn export_config<P: AsRef<Path>>(config: &SystemConfig, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_load_default_config() {
        let config = ConfigLoader::new().without_environment().load().unwrap();
        assert_eq!(config, SystemConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[eeg]\nwindow_size = 128\nmains_frequency_hz = 60.0").unwrap();
        writeln!(file, "[quality]\nmains_frequency_hz = 60.0").unwrap();

        let config = ConfigLoader::with_file(file.path()).without_environment().load().unwrap();
        assert_eq!(config.eeg.window_size, 128);
        assert_eq!(config.eeg.mains_frequency_hz, 60.0);
        assert_eq!(config.motion, crate::config::MotionConfig::default());
    }

    #[test]
    #[serial]
    fn test_missing_file() {
        let result = ConfigLoader::with_file("/nonexistent/brainwave.toml").load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    #[serial]
    fn test_invalid_config_rejected() {
        let result = ConfigLoader::from_toml_str("[eeg]\nwindow_size = 2");
        match result {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("Window size")));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        std::env::set_var("BRAINWAVE_MOTION__NOD_THRESHOLD_G", "0.6");
        let config = ConfigLoader::new().load();
        std::env::remove_var("BRAINWAVE_MOTION__NOD_THRESHOLD_G");

        let config = config.unwrap();
        assert_eq!(config.motion.nod_threshold_g, 0.6);
    }

    #[test]
    #[serial]
    fn test_environment_override_nested_eeg_key() {
        std::env::set_var("BRAINWAVE_EEG__WINDOW_SIZE", "128");
        let config = ConfigLoader::new().load();
        std::env::remove_var("BRAINWAVE_EEG__WINDOW_SIZE");

        let config = config.unwrap();
        assert_eq!(config.eeg.window_size, 128);
        assert_eq!(config.motion, crate::config::MotionConfig::default());
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[motion]\ntilt_threshold_g = 0.4").unwrap();

        std::env::set_var("BRAINWAVE_MOTION__TILT_THRESHOLD_G", "0.5");
        let config = ConfigLoader::with_file(file.path()).load();
        std::env::remove_var("BRAINWAVE_MOTION__TILT_THRESHOLD_G");

        assert_eq!(config.unwrap().motion.tilt_threshold_g, 0.5);
    }

    #[test]
    #[serial]
    fn test_environment_ignored_when_disabled() {
        std::env::set_var("BRAINWAVE_MOTION__NOD_THRESHOLD_G", "0.6");
        let config = ConfigLoader::new().without_environment().load();
        std::env::remove_var("BRAINWAVE_MOTION__NOD_THRESHOLD_G");

        assert_eq!(config.unwrap().motion.nod_threshold_g, 0.8);
    }

    #[test]
    #[serial]
    fn test_config_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exported.toml");

        let mut config = SystemConfig::default();
        config.eeg.enable_fft_cache = true;
        ConfigLoader::export_config(&config, &path).unwrap();

        let reloaded = ConfigLoader::from_toml_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(reloaded.eeg.enable_fft_cache);
    }
}

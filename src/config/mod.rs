// src/config/mod.rs
//! Configuration management

pub mod constants;
pub mod loader;
pub mod processing_config;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};
pub use processing_config::*;

use serde::{Deserialize, Serialize};

/// Complete configuration for a brainwave session
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct SystemConfig {
    /// Spectral analysis and metrics
    #[serde(default)]
    pub eeg: EegConfig,
    /// Signal quality thresholds
    #[serde(default)]
    pub quality: QualityConfig,
    /// Inertial gestures
    #[serde(default)]
    pub motion: MotionConfig,
    /// Compute worker
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl SystemConfig {
    /// Validate configuration consistency
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        validate_eeg_config(&self.eeg, &mut errors);
        validate_quality_config(&self.quality, &mut errors);
        validate_motion_config(&self.motion, &mut errors);
        validate_pipeline_config(&self.pipeline, &mut errors);

        // Quality assessment runs on the same stream as spectral analysis
        if (self.eeg.sample_rate_hz - self.quality.sample_rate_hz).abs() > f64::EPSILON {
            errors.push(format!(
                "EEG sample rate ({} Hz) and quality sample rate ({} Hz) differ",
                self.eeg.sample_rate_hz, self.quality.sample_rate_hz
            ));
        }
        if (self.eeg.mains_frequency_hz - self.quality.mains_frequency_hz).abs() > f64::EPSILON {
            errors.push(format!(
                "Notch frequency ({} Hz) and quality line-noise frequency ({} Hz) differ",
                self.eeg.mains_frequency_hz, self.quality.mains_frequency_hz
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Get configuration summary
    pub fn get_summary(&self) -> ConfigSummary {
        ConfigSummary {
            eeg_sample_rate_hz: self.eeg.sample_rate_hz,
            window_size: self.eeg.window_size,
            window_duration_ms: self.eeg.window_size as f64 * 1000.0 / self.eeg.sample_rate_hz,
            mains_frequency_hz: self.eeg.mains_frequency_hz,
            motion_sample_rate_hz: self.motion.sample_rate_hz,
            fft_cache_enabled: self.eeg.enable_fft_cache,
        }
    }
}

/// Configuration summary for display/logging
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    /// EEG sample rate (Hz)
    pub eeg_sample_rate_hz: f64,
    /// Analysis window (samples)
    pub window_size: usize,
    /// Analysis window (ms)
    pub window_duration_ms: f64,
    /// Notch frequency (Hz)
    pub mains_frequency_hz: f64,
    /// Inertial sample rate (Hz)
    pub motion_sample_rate_hz: f64,
    /// Whether spectra are memoized
    pub fft_cache_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = SystemConfig::default();
        assert_eq!(config.eeg.sample_rate_hz, signal::DEFAULT_SAMPLE_RATE_HZ);
        assert_eq!(config.eeg.window_size, spectral::DEFAULT_WINDOW_SIZE);
        assert!(config.validate_consistency().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = SystemConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: SystemConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_mismatched_rates_rejected() {
        let mut config = SystemConfig::default();
        config.quality.sample_rate_hz = 128.0;

        let errors = config.validate_consistency().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("differ")));
    }

    #[test]
    fn test_summary() {
        let summary = SystemConfig::default().get_summary();
        assert_eq!(summary.window_size, 64);
        assert!((summary.window_duration_ms - 250.0).abs() < 1e-9);
    }
}

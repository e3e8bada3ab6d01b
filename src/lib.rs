//! Brainwave-Core: real-time EEG and head-motion processing
//!
//! This library turns a live 4-channel EEG stream plus an optional 6-axis
//! inertial stream into values a visualiser can consume:
//!
//! - Band powers (delta to gamma) from ring-buffered, notch-filtered windows
//! - Baseline-relative, smoothed attention and relaxation indices
//! - Per-channel signal quality with actionable warnings
//! - Nod, shake and tilt gestures with cooldown
//! - A background compute worker behind bounded, non-blocking queues
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use brainwave_core::{BrainSession, SystemConfig};
//! use ndarray::Array2;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = BrainSession::new(SystemConfig::default())?;
//!
//!     // Blocks are [samples, channels] in µV
//!     let block = Array2::<f64>::zeros((32, 4));
//!     session.push_raw_block(block.view());
//!
//!     let metrics = session.latest_metrics();
//!     println!("attention {:.2}", metrics.attention);
//!
//!     session.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod acquisition;
pub mod config;
pub mod error;
pub mod motion;
pub mod processing;
pub mod session;
pub mod types;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{ConfigLoader, SystemConfig};
pub use error::{BrainwaveError, BrainwaveResult};
pub use motion::{InertialSample, MotionMetrics, MotionProcessor, TiltDirection};
pub use processing::{
    CalibrationBaseline, ComputePipeline, EegProcessor, MetricsSnapshot, PipelineStats, QualityAssessor,
    QualityReport, QualityStatus,
};
pub use session::{BrainSession, GestureEvents};
pub use types::{Band, BandMap, BandPowers, ChannelBandPowers, FrequencyBand};
pub use utils::time::{current_timestamp_nanos, TimeProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Real-time EEG and head-motion processing core".to_string(),
        features: vec![
            "Ring-buffered 4-channel EEG ingestion".to_string(),
            "Notch-filtered FFT band powers".to_string(),
            "Calibrated attention and relaxation indices".to_string(),
            "Signal quality assessment".to_string(),
            "Inertial gesture detection".to_string(),
            "Background compute worker with bounded queues".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        let info = version_info();
        assert_eq!(info.name, NAME);
        assert_eq!(info.version, VERSION);
        assert!(!info.features.is_empty());
    }
}

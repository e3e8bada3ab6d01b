// src/session.rs
//! Session facade over the compute pipeline, quality assessor and motion engine
//!
//! All methods take `&self` so a session can be shared between an
//! acquisition thread and a render thread behind an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use ndarray::{Array2, ArrayView2};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::acquisition::MultiChannelBuffer;
use crate::config::constants::signal;
use crate::config::{ConfigError, SystemConfig};
use crate::error::{BrainwaveError, BrainwaveResult};
use crate::motion::{MotionMetrics, MotionProcessor, TiltDirection};
use crate::processing::calibration::CalibrationBaseline;
use crate::processing::pipeline::{ComputePipeline, MetricsSnapshot, PipelineStats};
use crate::processing::quality_monitor::{QualityAssessor, QualityReport};
use crate::utils::time::{MonotonicTimeProvider, TimeProvider};

/// Gestures detected by one poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureEvents {
    /// A nod was detected
    pub nod: bool,
    /// A shake was detected
    pub shake: bool,
    /// Direction of a detected tilt
    pub tilt: Option<TiltDirection>,
}

impl GestureEvents {
    /// At least one gesture fired
    pub fn any(&self) -> bool {
        self.nod || self.shake || self.tilt.is_some()
    }
}

/// One live EEG + motion session
pub struct BrainSession {
    config: SystemConfig,
    pipeline: Mutex<ComputePipeline>,
    motion: Mutex<MotionProcessor>,
    quality: QualityAssessor,
    recent: Mutex<MultiChannelBuffer>,
}

impl BrainSession {
    /// Validate `config` and start the compute worker
    pub fn new(config: SystemConfig) -> BrainwaveResult<Self> {
        Self::with_time_provider(config, Arc::new(MonotonicTimeProvider::new()))
    }

    /// Gesture cooldowns and result timestamps use `clock`
    pub fn with_time_provider(config: SystemConfig, clock: Arc<dyn TimeProvider>) -> BrainwaveResult<Self> {
        config.validate_consistency().map_err(ConfigError::Validation)?;

        let mut pipeline =
            ComputePipeline::with_time_provider(config.eeg.clone(), config.pipeline.clone(), Arc::clone(&clock))?;
        pipeline.start()?;

        let motion = MotionProcessor::with_time_provider(config.motion.clone(), clock)?;
        let recent = MultiChannelBuffer::new(signal::EEG_CHANNEL_COUNT, config.quality.recent_window_samples)
            .map_err(|e| BrainwaveError::configuration("quality", e.to_string()))?;
        let quality = QualityAssessor::new(config.quality.clone());

        info!(
            "Session started: EEG {} Hz, inertial {} Hz",
            config.eeg.sample_rate_hz, config.motion.sample_rate_hz
        );

        Ok(Self {
            config,
            pipeline: Mutex::new(pipeline),
            motion: Mutex::new(motion),
            quality,
            recent: Mutex::new(recent),
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Hand a `[samples, channels]` block to the worker and keep its rows for
    /// quality checks. Never blocks; returns false when the block was empty
    /// or dropped.
    pub fn push_raw_block(&self, block: ArrayView2<'_, f64>) -> bool {
        let (rows, cols) = block.dim();
        if rows == 0 || cols == 0 {
            return false;
        }
        self.recent.lock().append_block(block);
        self.pipeline.lock().submit(block)
    }

    /// Feed one inertial reading to the motion engine on the caller's thread
    pub fn push_inertial_sample(&self, acc: [f64; 3], gyro: [f64; 3], timestamp: f64) {
        self.motion.lock().add_sample(acc, gyro, timestamp);
    }

    /// Newest metrics without blocking on the worker
    pub fn latest_metrics(&self) -> MetricsSnapshot {
        self.pipeline.lock().latest_metrics()
    }

    /// Score an arbitrary `[samples, channels]` block
    pub fn assess_quality(&self, block: ArrayView2<'_, f64>) -> QualityReport {
        self.quality.assess_quality(block)
    }

    /// Quality of the most recently pushed rows
    pub fn assess_recent_quality(&self) -> QualityReport {
        let recent = self.recent.lock();
        let rows = recent.channel(0).map_or(0, |ch| ch.len());
        let columns: Vec<Vec<f64>> = recent.channels().iter().map(|ch| ch.to_vec()).collect();
        drop(recent);

        let block = Array2::from_shape_fn((rows, columns.len()), |(row, col)| {
            columns[col].get(row).copied().unwrap_or_default()
        });
        self.quality.assess_quality(block.view())
    }

    /// Run every gesture detector once
    pub fn poll_gestures(&self) -> GestureEvents {
        let mut motion = self.motion.lock();
        GestureEvents {
            nod: motion.detect_nod(),
            shake: motion.detect_shake(),
            tilt: motion.detect_tilt_change(),
        }
    }

    /// Snapshot of the current motion state
    pub fn motion_metrics(&self) -> MotionMetrics {
        self.motion.lock().motion_metrics()
    }

    /// Start a calibration in the worker; metrics keep flowing meanwhile
    pub fn start_calibration(&self, duration: Duration) -> bool {
        debug!("Calibration requested for {:.1}s", duration.as_secs_f64());
        self.pipeline.lock().start_calibration(duration)
    }

    /// Calibrate for the configured duration
    pub fn start_default_calibration(&self) -> bool {
        match Duration::try_from_secs_f64(self.config.eeg.calibration_secs) {
            Ok(duration) => self.start_calibration(duration),
            Err(e) => {
                warn!("Calibration duration {}s unusable: {}", self.config.eeg.calibration_secs, e);
                false
            }
        }
    }

    /// Install an explicit baseline in the worker
    pub fn set_baseline(&self, baseline: CalibrationBaseline) -> bool {
        self.pipeline.lock().set_baseline(baseline)
    }

    /// Reset EEG state in the worker and clear motion and quality history
    pub fn reset(&self) -> bool {
        self.recent.lock().clear();
        self.motion.lock().reset();
        self.pipeline.lock().reset()
    }

    /// Worker queue counters
    pub fn pipeline_stats(&self) -> PipelineStats {
        self.pipeline.lock().stats()
    }

    /// Stop the worker. Returns false if it had to be detached.
    pub fn shutdown(&self) -> bool {
        info!("Session shutting down");
        self.pipeline.lock().shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SystemConfig::default();
        config.quality.sample_rate_hz = 128.0;
        assert!(matches!(
            BrainSession::new(config),
            Err(BrainwaveError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_non_finite_durations_rejected() {
        let mut config = SystemConfig::default();
        config.eeg.calibration_secs = f64::INFINITY;
        assert!(matches!(
            BrainSession::new(config),
            Err(BrainwaveError::Config(ConfigError::Validation(_)))
        ));

        let mut config = SystemConfig::default();
        config.motion.gesture_cooldown_secs = f64::NAN;
        assert!(BrainSession::new(config).is_err());
    }

    #[test]
    fn test_default_calibration_uses_config() {
        let session = BrainSession::new(SystemConfig::default()).unwrap();
        assert!(session.start_default_calibration());
        assert!(session.shutdown());
    }

    #[test]
    fn test_empty_block_is_noop() {
        let session = BrainSession::new(SystemConfig::default()).unwrap();
        assert!(!session.push_raw_block(Array2::<f64>::zeros((0, 4)).view()));
        assert_eq!(session.pipeline_stats().submitted, 0);
        assert!(session.shutdown());
    }

    #[test]
    fn test_recent_quality_not_connected_without_data() {
        let session = BrainSession::new(SystemConfig::default()).unwrap();
        let report = session.assess_recent_quality();
        assert_eq!(report, QualityReport::not_connected());
    }

    #[test]
    fn test_recent_window_bounded() {
        let session = BrainSession::new(SystemConfig::default()).unwrap();
        session.push_raw_block(Array2::<f64>::zeros((300, 4)).view());
        session.push_raw_block(Array2::<f64>::zeros((300, 4)).view());

        assert_eq!(session.recent.lock().channel(0).map(|ch| ch.len()), Some(256));
        // All-zero input over a full window
        assert_eq!(session.assess_recent_quality().overall_quality, 53);
    }
}

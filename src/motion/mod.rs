// src/motion/mod.rs
//! Head-motion processing from the 6-axis inertial stream
//!
//! Accelerometer samples are in g, gyroscope samples in deg/s, both at the
//! inertial rate (52 Hz by default). Two seconds of history are kept.

pub mod gestures;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::acquisition::ChannelRingBuffer;
use crate::config::constants::motion;
use crate::config::{validate_motion_config, MotionConfig};
use crate::error::{BrainwaveError, BrainwaveResult};
use crate::utils::stats;
use crate::utils::time::{MonotonicTimeProvider, TimeProvider};

pub use gestures::{Cooldown, NodDetector, ShakeDetector, TiltDetector, TiltDirection};

/// One inertial reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InertialSample {
    /// Acceleration `[x, y, z]` in g
    pub acc: [f64; 3],
    /// Angular velocity `[x, y, z]` in deg/s
    pub gyro: [f64; 3],
    /// Acquisition timestamp in seconds
    pub timestamp: f64,
}

/// Snapshot of the derived motion state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionMetrics {
    /// See `MotionProcessor::head_tilt`
    pub tilt_left_right: f64,
    /// See `MotionProcessor::head_tilt`
    pub tilt_forward_backward: f64,
    /// 0 (still) to 1
    pub motion_intensity: f64,
    /// Intensity below the stillness threshold
    pub is_still: bool,
    /// deg/s
    pub rotation_speed: f64,
    /// Latest accelerometer vector (g)
    pub acc: [f64; 3],
    /// Latest gyroscope vector (deg/s)
    pub gyro: [f64; 3],
}

/// Inertial buffers, motion estimators and gesture detectors
pub struct MotionProcessor {
    config: MotionConfig,
    acc: ChannelRingBuffer<[f64; 3]>,
    gyro: ChannelRingBuffer<[f64; 3]>,
    current_acc: [f64; 3],
    current_gyro: [f64; 3],
    last_timestamp: Option<f64>,
    motion_intensity: f64,
    is_still: bool,
    nod: NodDetector,
    shake: ShakeDetector,
    tilt: TiltDetector,
    clock: Arc<dyn TimeProvider>,
}

impl MotionProcessor {
    /// Processor on the monotonic clock
    pub fn new(config: MotionConfig) -> BrainwaveResult<Self> {
        Self::with_time_provider(config, Arc::new(MonotonicTimeProvider::new()))
    }

    /// Gesture cooldowns are measured on `clock`
    pub fn with_time_provider(config: MotionConfig, clock: Arc<dyn TimeProvider>) -> BrainwaveResult<Self> {
        let mut errors = Vec::new();
        validate_motion_config(&config, &mut errors);
        if !errors.is_empty() {
            return Err(BrainwaveError::configuration("motion", errors.join("; ")));
        }

        let capacity = config.buffer_capacity();
        let acc = ChannelRingBuffer::new(capacity)
            .map_err(|e| BrainwaveError::configuration("motion", e.to_string()))?;
        let gyro = ChannelRingBuffer::new(capacity)
            .map_err(|e| BrainwaveError::configuration("motion", e.to_string()))?;

        let nod = NodDetector::new(
            config.nod_threshold_g,
            config.samples_for(motion::NOD_WINDOW_SECS),
            Cooldown::from_secs(config.gesture_cooldown_secs)?,
        );
        let shake = ShakeDetector::new(
            config.shake_threshold_dps,
            config.samples_for(motion::SHAKE_WINDOW_SECS),
            Cooldown::from_secs(config.gesture_cooldown_secs)?,
        );
        let tilt = TiltDetector::new(config.tilt_threshold_g, Cooldown::from_secs(config.tilt_cooldown_secs)?);

        Ok(Self {
            config,
            acc,
            gyro,
            current_acc: [0.0; 3],
            current_gyro: [0.0; 3],
            last_timestamp: None,
            motion_intensity: 0.0,
            is_still: true,
            nod,
            shake,
            tilt,
            clock,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Buffer one reading and refresh intensity and stillness
    pub fn add_sample(&mut self, acc: [f64; 3], gyro: [f64; 3], timestamp: f64) {
        self.acc.push(acc);
        self.gyro.push(gyro);
        self.current_acc = acc;
        self.current_gyro = gyro;
        self.last_timestamp = Some(timestamp);
        self.update_motion_state();
    }

    /// Buffer an `InertialSample`
    pub fn push_sample(&mut self, sample: &InertialSample) {
        self.add_sample(sample.acc, sample.gyro, sample.timestamp);
    }

    fn update_motion_state(&mut self) {
        if self.acc.len() < motion::MIN_INTENSITY_SAMPLES {
            return;
        }

        let window = self
            .config
            .samples_for(motion::INTENSITY_WINDOW_SECS)
            .min(self.acc.len());
        let acc_std = mean_axis_std(&self.acc.latest(window).unwrap_or_default());
        let gyro_std = mean_axis_std(&self.gyro.latest(window).unwrap_or_default());

        self.motion_intensity = ((acc_std / motion::ACC_STD_SCALE_G + gyro_std / motion::GYRO_STD_SCALE_DPS) / 2.0)
            .clamp(0.0, 1.0);
        self.is_still = self.motion_intensity < motion::STILL_THRESHOLD;
    }

    /// `(left_right, forward_backward)` in [-1, 1] from the current gravity
    /// vector. Positive left/right is a right tilt, positive
    /// forward/backward a forward tilt.
    pub fn head_tilt(&self) -> (f64, f64) {
        if self.acc.is_empty() {
            return (0.0, 0.0);
        }
        (
            self.current_acc[1].clamp(-1.0, 1.0),
            (-self.current_acc[0]).clamp(-1.0, 1.0),
        )
    }

    /// Magnitude of the current angular velocity (deg/s)
    pub fn rotation_speed(&self) -> f64 {
        if self.gyro.is_empty() {
            return 0.0;
        }
        self.current_gyro.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Latest intensity estimate in [0, 1]
    pub fn motion_intensity(&self) -> f64 {
        self.motion_intensity
    }

    /// True while intensity is below the stillness threshold
    pub fn is_still(&self) -> bool {
        self.is_still
    }

    /// Timestamp of the newest sample
    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    /// Samples currently buffered
    pub fn len(&self) -> usize {
        self.acc.len()
    }

    /// True when no sample is buffered
    pub fn is_empty(&self) -> bool {
        self.acc.is_empty()
    }

    /// Snapshot of the current motion state
    pub fn motion_metrics(&self) -> MotionMetrics {
        let (tilt_left_right, tilt_forward_backward) = self.head_tilt();
        MotionMetrics {
            tilt_left_right,
            tilt_forward_backward,
            motion_intensity: self.motion_intensity,
            is_still: self.is_still,
            rotation_speed: self.rotation_speed(),
            acc: self.current_acc,
            gyro: self.current_gyro,
        }
    }

    /// True once per nod; see `NodDetector`
    pub fn detect_nod(&mut self) -> bool {
        let acc_x: Vec<f64> = self.acc.to_vec().iter().map(|a| a[0]).collect();
        self.nod.detect(&acc_x, self.clock.now_nanos())
    }

    /// True once per shake; see `ShakeDetector`
    pub fn detect_shake(&mut self) -> bool {
        let gyro_z: Vec<f64> = self.gyro.to_vec().iter().map(|g| g[2]).collect();
        self.shake.detect(&gyro_z, self.clock.now_nanos())
    }

    /// Tilt direction past the threshold, at most once per tilt cooldown
    pub fn detect_tilt_change(&mut self) -> Option<TiltDirection> {
        let (left_right, forward_backward) = self.head_tilt();
        self.tilt.detect(left_right, forward_backward, self.clock.now_nanos())
    }

    /// Clear buffers, current vectors and the derived intensity/stillness.
    /// Gesture cooldowns are kept.
    pub fn reset(&mut self) {
        self.acc.clear();
        self.gyro.clear();
        self.current_acc = [0.0; 3];
        self.current_gyro = [0.0; 3];
        self.last_timestamp = None;
        self.motion_intensity = 0.0;
        self.is_still = true;
    }

    /// Allow every gesture to fire again immediately
    pub fn reset_cooldowns(&mut self) {
        self.nod.reset();
        self.shake.reset();
        self.tilt.reset();
    }
}

/// Population standard deviation of each axis, averaged over the axes
fn mean_axis_std(samples: &[[f64; 3]]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let total: f64 = (0..3)
        .map(|axis| {
            let values: Vec<f64> = samples.iter().map(|s| s[axis]).collect();
            stats::std_dev(&values)
        })
        .sum();
    total / 3.0
}

// src/config/processing_config.rs
//! Processing stage configuration structures

use serde::{Deserialize, Serialize};

use crate::config::constants::{metrics, motion, pipeline, quality, signal, spectral};
use crate::types::BandTable;

/// Spectral analysis and metric configuration for the EEG path
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EegConfig {
    /// EEG sample rate (Hz)
    #[serde(default = "defaults::eeg_sample_rate_hz")]
    pub sample_rate_hz: f64,

    /// Analysis window in samples
    #[serde(default = "defaults::window_size")]
    pub window_size: usize,

    /// Notch frequency (Hz)
    #[serde(default = "defaults::mains_frequency_hz")]
    pub mains_frequency_hz: f64,

    /// Notch filter Q
    #[serde(default = "defaults::notch_quality_factor")]
    pub notch_quality_factor: f64,

    /// Band edges used for band powers
    #[serde(default = "BandTable::standard")]
    pub bands: BandTable,

    /// Default calibration length
    #[serde(default = "defaults::calibration_secs")]
    pub calibration_secs: f64,

    /// Values averaged per metric
    #[serde(default = "defaults::smoothing_history")]
    pub smoothing_history: usize,

    /// Memoize spectra of identical windows
    #[serde(default)]
    pub enable_fft_cache: bool,

    /// Spectra kept when the cache is enabled
    #[serde(default = "defaults::spectrum_cache_capacity")]
    pub fft_cache_capacity: usize,
}

/// Signal quality thresholds
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct QualityConfig {
    /// Must match the EEG sample rate
    #[serde(default = "defaults::eeg_sample_rate_hz")]
    pub sample_rate_hz: f64,
    /// Frequency checked for line noise
    #[serde(default = "defaults::mains_frequency_hz")]
    pub mains_frequency_hz: f64,
    /// Variance (µV²) below this scores 20
    #[serde(default = "defaults::variance_min")]
    pub variance_min: f64,
    /// Variance above this scores 30
    #[serde(default = "defaults::variance_max")]
    pub variance_max: f64,
    /// Variance range scored 100
    #[serde(default = "defaults::variance_optimal")]
    pub variance_optimal: (f64, f64),
    /// Peak-to-peak (µV) below this scores 30
    #[serde(default = "defaults::amplitude_min")]
    pub amplitude_min: f64,
    /// Peak-to-peak above this scores 20
    #[serde(default = "defaults::amplitude_max")]
    pub amplitude_max: f64,
    /// Peak-to-peak range scored 100
    #[serde(default = "defaults::amplitude_optimal")]
    pub amplitude_optimal: (f64, f64),
    /// Relative mains power scored 30 above this
    #[serde(default = "defaults::line_noise_max")]
    pub line_noise_max: f64,
    /// Relative mains power scored 60 above this
    #[serde(default = "defaults::line_noise_moderate")]
    pub line_noise_moderate: f64,
    /// Excess kurtosis scored 20 above this
    #[serde(default = "defaults::kurtosis_severe")]
    pub kurtosis_severe: f64,
    /// Excess kurtosis scored 50 above this
    #[serde(default = "defaults::kurtosis_moderate")]
    pub kurtosis_moderate: f64,
    /// Sample-to-sample jump (µV) scored 20 above this
    #[serde(default = "defaults::gradient_severe")]
    pub gradient_severe: f64,
    /// Sample-to-sample jump (µV) scored 50 above this
    #[serde(default = "defaults::gradient_moderate")]
    pub gradient_moderate: f64,
    /// Rows the session keeps for `assess_recent_quality`
    #[serde(default = "defaults::recent_window_samples")]
    pub recent_window_samples: usize,
}

/// Inertial gesture detection configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MotionConfig {
    /// Inertial sample rate (Hz)
    #[serde(default = "defaults::motion_sample_rate_hz")]
    pub sample_rate_hz: f64,
    /// Accelerometer X range (g) for a nod
    #[serde(default = "defaults::nod_threshold_g")]
    pub nod_threshold_g: f64,
    /// Gyroscope Z peak (deg/s) for a shake
    #[serde(default = "defaults::shake_threshold_dps")]
    pub shake_threshold_dps: f64,
    /// Head tilt (g) for a tilt event
    #[serde(default = "defaults::tilt_threshold_g")]
    pub tilt_threshold_g: f64,
    /// Nod and shake cooldown
    #[serde(default = "defaults::gesture_cooldown_secs")]
    pub gesture_cooldown_secs: f64,
    /// Tilt cooldown
    #[serde(default = "defaults::tilt_cooldown_secs")]
    pub tilt_cooldown_secs: f64,
}

/// Background compute worker configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Raw blocks waiting for the worker
    #[serde(default = "defaults::work_queue_capacity")]
    pub work_queue_capacity: usize,
    /// Unread metric snapshots
    #[serde(default = "defaults::result_queue_capacity")]
    pub result_queue_capacity: usize,
    /// Idle wake-up period of the worker
    #[serde(default = "defaults::worker_poll_timeout_ms")]
    pub worker_poll_timeout_ms: u64,
    /// Shutdown wait before the worker is detached
    #[serde(default = "defaults::join_timeout_ms")]
    pub join_timeout_ms: u64,
    /// Minimum spacing of calibration samples
    #[serde(default = "defaults::calibration_sample_interval_ms")]
    pub calibration_sample_interval_ms: u64,
}

/// Default value providers using constants
pub(crate) mod defaults {
    use super::*;

    pub fn eeg_sample_rate_hz() -> f64 { signal::DEFAULT_SAMPLE_RATE_HZ }
    pub fn window_size() -> usize { spectral::DEFAULT_WINDOW_SIZE }
    pub fn mains_frequency_hz() -> f64 { spectral::DEFAULT_MAINS_FREQUENCY_HZ }
    pub fn notch_quality_factor() -> f64 { spectral::NOTCH_QUALITY_FACTOR }
    pub fn calibration_secs() -> f64 { metrics::DEFAULT_CALIBRATION_SECS }
    pub fn smoothing_history() -> usize { metrics::SMOOTHING_HISTORY }
    pub fn spectrum_cache_capacity() -> usize { spectral::SPECTRUM_CACHE_CAPACITY }

    pub fn variance_min() -> f64 { quality::VARIANCE_MIN }
    pub fn variance_max() -> f64 { quality::VARIANCE_MAX }
    pub fn variance_optimal() -> (f64, f64) { quality::VARIANCE_OPTIMAL }
    pub fn amplitude_min() -> f64 { quality::AMPLITUDE_MIN }
    pub fn amplitude_max() -> f64 { quality::AMPLITUDE_MAX }
    pub fn amplitude_optimal() -> (f64, f64) { quality::AMPLITUDE_OPTIMAL }
    pub fn line_noise_max() -> f64 { quality::LINE_NOISE_MAX }
    pub fn line_noise_moderate() -> f64 { quality::LINE_NOISE_MODERATE }
    pub fn kurtosis_severe() -> f64 { quality::KURTOSIS_SEVERE }
    pub fn kurtosis_moderate() -> f64 { quality::KURTOSIS_MODERATE }
    pub fn gradient_severe() -> f64 { quality::GRADIENT_SEVERE }
    pub fn gradient_moderate() -> f64 { quality::GRADIENT_MODERATE }
    pub fn recent_window_samples() -> usize { quality::RECENT_WINDOW_SAMPLES }

    pub fn motion_sample_rate_hz() -> f64 { motion::DEFAULT_SAMPLE_RATE_HZ }
    pub fn nod_threshold_g() -> f64 { motion::NOD_THRESHOLD_G }
    pub fn shake_threshold_dps() -> f64 { motion::SHAKE_THRESHOLD_DPS }
    pub fn tilt_threshold_g() -> f64 { motion::TILT_THRESHOLD_G }
    pub fn gesture_cooldown_secs() -> f64 { motion::GESTURE_COOLDOWN_SECS }
    pub fn tilt_cooldown_secs() -> f64 { motion::TILT_COOLDOWN_SECS }

    pub fn work_queue_capacity() -> usize { pipeline::WORK_QUEUE_CAPACITY }
    pub fn result_queue_capacity() -> usize { pipeline::RESULT_QUEUE_CAPACITY }
    pub fn worker_poll_timeout_ms() -> u64 { pipeline::WORKER_POLL_TIMEOUT_MS }
    pub fn join_timeout_ms() -> u64 { pipeline::JOIN_TIMEOUT_MS }
    pub fn calibration_sample_interval_ms() -> u64 { pipeline::CALIBRATION_SAMPLE_INTERVAL_MS }
}

impl Default for EegConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: defaults::eeg_sample_rate_hz(),
            window_size: defaults::window_size(),
            mains_frequency_hz: defaults::mains_frequency_hz(),
            notch_quality_factor: defaults::notch_quality_factor(),
            bands: BandTable::standard(),
            calibration_secs: defaults::calibration_secs(),
            smoothing_history: defaults::smoothing_history(),
            enable_fft_cache: false,
            fft_cache_capacity: defaults::spectrum_cache_capacity(),
        }
    }
}

impl EegConfig {
    /// Ring buffer capacity per channel
    pub fn buffer_capacity(&self) -> usize {
        self.window_size * signal::BUFFER_WINDOWS
    }

    /// Half the sample rate
    pub fn nyquist_hz(&self) -> f64 {
        self.sample_rate_hz / 2.0
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: defaults::eeg_sample_rate_hz(),
            mains_frequency_hz: defaults::mains_frequency_hz(),
            variance_min: defaults::variance_min(),
            variance_max: defaults::variance_max(),
            variance_optimal: defaults::variance_optimal(),
            amplitude_min: defaults::amplitude_min(),
            amplitude_max: defaults::amplitude_max(),
            amplitude_optimal: defaults::amplitude_optimal(),
            line_noise_max: defaults::line_noise_max(),
            line_noise_moderate: defaults::line_noise_moderate(),
            kurtosis_severe: defaults::kurtosis_severe(),
            kurtosis_moderate: defaults::kurtosis_moderate(),
            gradient_severe: defaults::gradient_severe(),
            gradient_moderate: defaults::gradient_moderate(),
            recent_window_samples: defaults::recent_window_samples(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: defaults::motion_sample_rate_hz(),
            nod_threshold_g: defaults::nod_threshold_g(),
            shake_threshold_dps: defaults::shake_threshold_dps(),
            tilt_threshold_g: defaults::tilt_threshold_g(),
            gesture_cooldown_secs: defaults::gesture_cooldown_secs(),
            tilt_cooldown_secs: defaults::tilt_cooldown_secs(),
        }
    }
}

impl MotionConfig {
    /// Samples held by each inertial ring buffer (2 s)
    pub fn buffer_capacity(&self) -> usize {
        (self.sample_rate_hz * motion::BUFFER_SECONDS) as usize
    }

    /// Whole samples covering `secs` at the inertial rate
    pub fn samples_for(&self, secs: f64) -> usize {
        (self.sample_rate_hz * secs) as usize
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_queue_capacity: defaults::work_queue_capacity(),
            result_queue_capacity: defaults::result_queue_capacity(),
            worker_poll_timeout_ms: defaults::worker_poll_timeout_ms(),
            join_timeout_ms: defaults::join_timeout_ms(),
            calibration_sample_interval_ms: defaults::calibration_sample_interval_ms(),
        }
    }
}

/// `0 < value <= max`; false for NaN and infinities
fn in_positive_range(value: f64, max: f64) -> bool {
    value.is_finite() && value > 0.0 && value <= max
}

/// `0 <= value <= max`; false for NaN and infinities
fn in_non_negative_range(value: f64, max: f64) -> bool {
    value.is_finite() && (0.0..=max).contains(&value)
}

/// Validate the EEG path configuration, collecting every violation
pub fn validate_eeg_config(config: &EegConfig, errors: &mut Vec<String>) {
    if !in_positive_range(config.sample_rate_hz, signal::MAX_SAMPLE_RATE_HZ) {
        errors.push(format!(
            "EEG sample rate must be in (0, {}] Hz (got {})",
            signal::MAX_SAMPLE_RATE_HZ, config.sample_rate_hz
        ));
    }
    if config.window_size < spectral::MIN_WINDOW_SIZE || config.window_size > spectral::MAX_WINDOW_SIZE {
        errors.push(format!(
            "Window size {} outside {}..={}",
            config.window_size,
            spectral::MIN_WINDOW_SIZE,
            spectral::MAX_WINDOW_SIZE
        ));
    }

    let nyquist = config.nyquist_hz();
    for (band, range) in config.bands.iter() {
        let ordered = range.low_hz >= 0.0 && range.low_hz < range.high_hz;
        if !ordered || !range.high_hz.is_finite() {
            errors.push(format!(
                "Band {} must satisfy 0 <= low < high (got {}..{} Hz)",
                band, range.low_hz, range.high_hz
            ));
        }
        if range.high_hz > nyquist {
            errors.push(format!(
                "Band {} upper edge ({} Hz) exceeds Nyquist frequency ({} Hz)",
                band, range.high_hz, nyquist
            ));
        }
    }

    if !(config.mains_frequency_hz > 0.0 && config.mains_frequency_hz < nyquist) {
        errors.push(format!(
            "Mains frequency ({} Hz) must be between 0 and Nyquist ({} Hz)",
            config.mains_frequency_hz, nyquist
        ));
    }
    if !in_positive_range(config.notch_quality_factor, f64::MAX) {
        errors.push("Notch quality factor must be positive and finite".to_string());
    }
    if !in_non_negative_range(config.calibration_secs, metrics::MAX_CALIBRATION_SECS) {
        errors.push(format!(
            "Calibration duration must be in [0, {}] s (got {})",
            metrics::MAX_CALIBRATION_SECS, config.calibration_secs
        ));
    }
    if config.smoothing_history == 0 {
        errors.push("Smoothing history must hold at least one value".to_string());
    }
    if config.enable_fft_cache && config.fft_cache_capacity == 0 {
        errors.push("FFT cache capacity must be positive when the cache is enabled".to_string());
    }
}

/// Validate quality thresholds
pub fn validate_quality_config(config: &QualityConfig, errors: &mut Vec<String>) {
    if !in_positive_range(config.sample_rate_hz, signal::MAX_SAMPLE_RATE_HZ) {
        errors.push(format!(
            "Quality sample rate must be in (0, {}] Hz (got {})",
            signal::MAX_SAMPLE_RATE_HZ, config.sample_rate_hz
        ));
    }
    if !(config.mains_frequency_hz > 0.0 && config.mains_frequency_hz < config.sample_rate_hz / 2.0) {
        errors.push(format!(
            "Quality mains frequency ({} Hz) must be between 0 and Nyquist",
            config.mains_frequency_hz
        ));
    }
    let thresholds = [
        ("variance_min", config.variance_min),
        ("variance_max", config.variance_max),
        ("variance_optimal.0", config.variance_optimal.0),
        ("variance_optimal.1", config.variance_optimal.1),
        ("amplitude_min", config.amplitude_min),
        ("amplitude_max", config.amplitude_max),
        ("amplitude_optimal.0", config.amplitude_optimal.0),
        ("amplitude_optimal.1", config.amplitude_optimal.1),
        ("line_noise_max", config.line_noise_max),
        ("line_noise_moderate", config.line_noise_moderate),
        ("kurtosis_severe", config.kurtosis_severe),
        ("kurtosis_moderate", config.kurtosis_moderate),
        ("gradient_severe", config.gradient_severe),
        ("gradient_moderate", config.gradient_moderate),
    ];
    for (name, value) in thresholds {
        if !value.is_finite() {
            errors.push(format!("Quality threshold {} must be finite (got {})", name, value));
        }
    }
    if config.variance_min >= config.variance_max {
        errors.push("variance_min must be lower than variance_max".to_string());
    }
    let (opt_low, opt_high) = config.variance_optimal;
    if opt_low <= config.variance_min || opt_high >= config.variance_max || opt_low > opt_high {
        errors.push("variance_optimal must lie strictly inside (variance_min, variance_max)".to_string());
    }
    if config.amplitude_min >= config.amplitude_max {
        errors.push("amplitude_min must be lower than amplitude_max".to_string());
    }
    if config.line_noise_moderate > config.line_noise_max {
        errors.push("line_noise_moderate cannot exceed line_noise_max".to_string());
    }
    if config.kurtosis_moderate > config.kurtosis_severe || config.gradient_moderate > config.gradient_severe {
        errors.push("Moderate artifact thresholds cannot exceed severe thresholds".to_string());
    }
}

/// Validate gesture thresholds
pub fn validate_motion_config(config: &MotionConfig, errors: &mut Vec<String>) {
    if !in_positive_range(config.sample_rate_hz, motion::MAX_SAMPLE_RATE_HZ) {
        errors.push(format!(
            "Inertial sample rate must be in (0, {}] Hz (got {})",
            motion::MAX_SAMPLE_RATE_HZ, config.sample_rate_hz
        ));
    }
    let thresholds = [config.nod_threshold_g, config.shake_threshold_dps, config.tilt_threshold_g];
    if !thresholds.iter().all(|&t| in_positive_range(t, f64::MAX)) {
        errors.push("Gesture thresholds must be positive and finite".to_string());
    }
    for (name, secs) in [
        ("gesture_cooldown_secs", config.gesture_cooldown_secs),
        ("tilt_cooldown_secs", config.tilt_cooldown_secs),
    ] {
        if !in_non_negative_range(secs, motion::MAX_COOLDOWN_SECS) {
            errors.push(format!(
                "{} must be in [0, {}] s (got {})",
                name,
                motion::MAX_COOLDOWN_SECS,
                secs
            ));
        }
    }
}

/// Validate worker configuration
pub fn validate_pipeline_config(config: &PipelineConfig, errors: &mut Vec<String>) {
    if config.work_queue_capacity == 0 || config.result_queue_capacity == 0 {
        errors.push("Queue capacities must be positive".to_string());
    }
    if config.worker_poll_timeout_ms == 0 {
        errors.push("Worker poll timeout must be positive".to_string());
    }
}

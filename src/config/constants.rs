// src/config/constants.rs
//! System-wide configuration constants

/// EEG acquisition constants
pub mod signal {
    /// Muse-class headsets stream EEG at 256 Hz
    pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 256.0;
    /// Channels used for analysis (TP9, AF7, AF8, TP10)
    pub const EEG_CHANNEL_COUNT: usize = 4;
    /// Electrode names in channel order
    pub const CHANNEL_NAMES: [&str; EEG_CHANNEL_COUNT] = ["TP9", "AF7", "AF8", "TP10"];
    /// Ring buffer capacity is this many analysis windows
    pub const BUFFER_WINDOWS: usize = 3;
    /// Highest EEG sample rate accepted from configuration
    pub const MAX_SAMPLE_RATE_HZ: f64 = 16_384.0;
}

/// Spectral analysis constants
pub mod spectral {
    /// 0.25 s at 256 Hz
    pub const DEFAULT_WINDOW_SIZE: usize = 64;
    /// Smallest analysis window in samples
    pub const MIN_WINDOW_SIZE: usize = 8;
    /// Largest analysis window in samples
    pub const MAX_WINDOW_SIZE: usize = 4096;
    /// Mains frequency removed by the notch filter
    pub const DEFAULT_MAINS_FREQUENCY_HZ: f64 = 50.0;
    /// Notch filter Q
    pub const NOTCH_QUALITY_FACTOR: f64 = 30.0;
    /// Entries kept by the bounded spectrum cache
    pub const SPECTRUM_CACHE_CAPACITY: usize = 100;

    /// Default band table as (low, high) Hz
    pub const DELTA_HZ: (f64, f64) = (1.0, 4.0);
    /// Theta band edges
    pub const THETA_HZ: (f64, f64) = (4.0, 8.0);
    /// Alpha band edges
    pub const ALPHA_HZ: (f64, f64) = (8.0, 13.0);
    /// Beta band edges
    pub const BETA_HZ: (f64, f64) = (13.0, 30.0);
    /// Gamma band edges
    pub const GAMMA_HZ: (f64, f64) = (30.0, 44.0);
}

/// Calibration and metric constants
pub mod metrics {
    /// Calibration length used by `start_default_calibration`
    pub const DEFAULT_CALIBRATION_SECS: f64 = 5.0;
    /// Calibration samples band powers at roughly this rate
    pub const CALIBRATION_SAMPLING_HZ: f64 = 2.0;
    /// Blocking calibration takes at least this many samples
    pub const MIN_CALIBRATION_SAMPLES: usize = 5;
    /// Longest calibration accepted from configuration (1 h)
    pub const MAX_CALIBRATION_SECS: f64 = 3600.0;
    /// Values averaged by each smoothed metric
    pub const SMOOTHING_HISTORY: usize = 5;
    /// Value reported before calibration completes
    pub const NEUTRAL_METRIC: f64 = 0.5;

    /// Attention = 0.7 beta ratio + 0.3 gamma ratio
    pub const ATTENTION_BETA_WEIGHT: f64 = 0.7;
    /// Weight of the gamma ratio in attention
    pub const ATTENTION_GAMMA_WEIGHT: f64 = 0.3;
    /// Relaxation = 0.8 alpha ratio + 0.2 theta ratio
    pub const RELAXATION_ALPHA_WEIGHT: f64 = 0.8;
    /// Weight of the theta ratio in relaxation
    pub const RELAXATION_THETA_WEIGHT: f64 = 0.2;
    /// Normalized ratios are clipped to [0, RATIO_CEILING] then divided by it
    pub const RATIO_CEILING: f64 = 2.0;

    /// Fallback baseline when calibration gathered nothing (µV²)
    pub const FALLBACK_DELTA: f64 = 100.0;
    /// Fallback theta baseline
    pub const FALLBACK_THETA: f64 = 50.0;
    /// Fallback alpha baseline
    pub const FALLBACK_ALPHA: f64 = 30.0;
    /// Fallback beta baseline
    pub const FALLBACK_BETA: f64 = 20.0;
    /// Fallback gamma baseline
    pub const FALLBACK_GAMMA: f64 = 10.0;
}

/// Signal quality thresholds
pub mod quality {
    /// Variance below this (µV²) means a dry or lifted sensor
    pub const VARIANCE_MIN: f64 = 10.0;
    /// Variance above this (µV²) means a noisy contact
    pub const VARIANCE_MAX: f64 = 10_000.0;
    /// Variance range scored 100
    pub const VARIANCE_OPTIMAL: (f64, f64) = (50.0, 500.0);
    /// Peak-to-peak above this (µV) is a movement artifact
    pub const AMPLITUDE_MAX: f64 = 500.0;
    /// Peak-to-peak below this (µV) is a flat signal
    pub const AMPLITUDE_MIN: f64 = 10.0;
    /// Peak-to-peak range scored 100
    pub const AMPLITUDE_OPTIMAL: (f64, f64) = (50.0, 200.0);
    /// Relative mains power scored 30 above this
    pub const LINE_NOISE_MAX: f64 = 0.3;
    /// Relative mains power scored 60 above this
    pub const LINE_NOISE_MODERATE: f64 = 0.15;
    /// Excess kurtosis thresholds for artifacts
    pub const KURTOSIS_SEVERE: f64 = 10.0;
    /// Moderate excess kurtosis
    pub const KURTOSIS_MODERATE: f64 = 5.0;
    /// Sample-to-sample jump thresholds (µV) for artifacts
    pub const GRADIENT_SEVERE: f64 = 100.0;
    /// Moderate sample-to-sample jump (µV)
    pub const GRADIENT_MODERATE: f64 = 50.0;
    /// Alpha and line-noise scoring need this many samples
    pub const MIN_SPECTRAL_SAMPLES: usize = 128;
    /// Stationarity scoring needs this many samples
    pub const MIN_STATIONARITY_SAMPLES: usize = 256;
    /// Longest Welch segment
    pub const WELCH_MAX_SEGMENT: usize = 256;
    /// Rows kept by the session for recent-window assessment (1 s)
    pub const RECENT_WINDOW_SAMPLES: usize = 256;

    /// Channel aggregate weights
    pub const WEIGHT_VARIANCE: f64 = 0.30;
    /// Weight of the amplitude score
    pub const WEIGHT_AMPLITUDE: f64 = 0.20;
    /// Weight of the alpha content score
    pub const WEIGHT_ALPHA: f64 = 0.15;
    /// Weight of the line noise score
    pub const WEIGHT_LINE_NOISE: f64 = 0.15;
    /// Weight of the artifact score
    pub const WEIGHT_ARTIFACTS: f64 = 0.15;
    /// Weight of the stationarity score
    pub const WEIGHT_STATIONARITY: f64 = 0.05;
}

/// Inertial (ACC/GYRO) constants
pub mod motion {
    /// Inertial rate of Muse-class headsets
    pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 52.0;
    /// Highest inertial rate accepted from configuration
    pub const MAX_SAMPLE_RATE_HZ: f64 = 1_000.0;
    /// History kept per inertial stream
    pub const BUFFER_SECONDS: f64 = 2.0;
    /// Window for the motion intensity estimate
    pub const INTENSITY_WINDOW_SECS: f64 = 0.5;
    /// Intensity is only estimated past this many samples
    pub const MIN_INTENSITY_SAMPLES: usize = 10;
    /// Accelerometer std (g) mapping to full intensity
    pub const ACC_STD_SCALE_G: f64 = 0.5;
    /// Gyroscope std (deg/s) mapping to full intensity
    pub const GYRO_STD_SCALE_DPS: f64 = 50.0;
    /// Intensity below this counts as still
    pub const STILL_THRESHOLD: f64 = 0.1;

    /// Accelerometer X range (g) needed for a nod
    pub const NOD_THRESHOLD_G: f64 = 0.8;
    /// Accelerometer history examined for a nod
    pub const NOD_WINDOW_SECS: f64 = 0.8;
    /// Gyroscope Z peak (deg/s) needed for a shake
    pub const SHAKE_THRESHOLD_DPS: f64 = 150.0;
    /// Gyroscope history examined for a shake
    pub const SHAKE_WINDOW_SECS: f64 = 1.0;
    /// Sign changes needed for a shake
    pub const SHAKE_MIN_ZERO_CROSSINGS: usize = 2;
    /// Gravity component (g) needed for a tilt
    pub const TILT_THRESHOLD_G: f64 = 0.3;

    /// Nod and shake cooldown
    pub const GESTURE_COOLDOWN_SECS: f64 = 1.5;
    /// Tilt cooldown
    pub const TILT_COOLDOWN_SECS: f64 = 0.5;
    /// Longest cooldown accepted from configuration
    pub const MAX_COOLDOWN_SECS: f64 = 3600.0;
}

/// Compute pipeline constants
pub mod pipeline {
    /// Raw blocks waiting for the worker
    pub const WORK_QUEUE_CAPACITY: usize = 5;
    /// Unread metric snapshots
    pub const RESULT_QUEUE_CAPACITY: usize = 5;
    /// Idle wake-up period of the worker
    pub const WORKER_POLL_TIMEOUT_MS: u64 = 100;
    /// How long shutdown waits before detaching the worker
    pub const JOIN_TIMEOUT_MS: u64 = 1000;
    /// Minimum spacing between calibration samples taken by the worker
    pub const CALIBRATION_SAMPLE_INTERVAL_MS: u64 = 500;
    /// Name of the compute worker thread
    pub const WORKER_THREAD_NAME: &str = "eeg-compute";
}

// src/motion/gestures.rs
//! Nod, shake and tilt detectors with per-gesture cooldown
//!
//! Detectors are pure over the sample window they are given plus the current
//! time in nanoseconds. Insufficient data is "no gesture", never an error.
//! Only a successful detection touches the cooldown.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::constants::motion;
use crate::error::{BrainwaveError, BrainwaveResult};

/// Minimum spacing between two detections of the same gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    period_nanos: u64,
    last_trigger: Option<u64>,
}

impl Cooldown {
    /// Cooldown that has never fired. Periods past `u64::MAX` ns saturate.
    pub fn new(period: Duration) -> Self {
        Self {
            period_nanos: u64::try_from(period.as_nanos()).unwrap_or(u64::MAX),
            last_trigger: None,
        }
    }

    /// Fails for negative, NaN or unrepresentable periods
    pub fn from_secs(secs: f64) -> BrainwaveResult<Self> {
        Duration::try_from_secs_f64(secs)
            .map(Self::new)
            .map_err(|e| BrainwaveError::configuration("motion", format!("invalid cooldown {}s: {}", secs, e)))
    }

    /// True when nothing fired yet or the period has fully elapsed
    pub fn is_ready(&self, now_nanos: u64) -> bool {
        match self.last_trigger {
            None => true,
            Some(last) => now_nanos.saturating_sub(last) >= self.period_nanos,
        }
    }

    /// Record a detection at `now_nanos`
    pub fn trigger(&mut self, now_nanos: u64) {
        self.last_trigger = Some(now_nanos);
    }

    /// Time of the last detection in nanoseconds
    pub fn last_trigger(&self) -> Option<u64> {
        self.last_trigger
    }

    /// Forget the last detection
    pub fn reset(&mut self) {
        self.last_trigger = None;
    }
}

/// Index of the first minimum and first maximum
fn first_extrema(values: &[f64]) -> (usize, usize) {
    let mut min_idx = 0;
    let mut max_idx = 0;
    for (i, &v) in values.iter().enumerate() {
        if v < values[min_idx] {
            min_idx = i;
        }
        if v > values[max_idx] {
            max_idx = i;
        }
    }
    (min_idx, max_idx)
}

fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Forward head nod, seen as a large excursion on the accelerometer X axis
#[derive(Debug, Clone)]
pub struct NodDetector {
    threshold_g: f64,
    window: usize,
    cooldown: Cooldown,
}

impl NodDetector {
    /// `window` is the number of accelerometer samples examined
    pub fn new(threshold_g: f64, window: usize, cooldown: Cooldown) -> Self {
        Self {
            threshold_g,
            window: window.max(1),
            cooldown,
        }
    }

    /// Samples examined per detection
    pub fn window(&self) -> usize {
        self.window
    }

    /// `acc_x` is the accelerometer X history, oldest first
    pub fn detect(&mut self, acc_x: &[f64], now_nanos: u64) -> bool {
        if !self.cooldown.is_ready(now_nanos) || acc_x.len() < self.window {
            return false;
        }

        let window = &acc_x[acc_x.len() - self.window..];
        let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = window.iter().copied().fold(f64::INFINITY, f64::min);
        if max - min <= self.threshold_g {
            return false;
        }

        // The extremum has to sit inside the window, not at an edge
        let (min_idx, max_idx) = first_extrema(window);
        let w = self.window as f64;
        let centred = |idx: usize| {
            let idx = idx as f64;
            idx > 0.2 * w && idx < 0.8 * w
        };

        if centred(min_idx) || centred(max_idx) {
            self.cooldown.trigger(now_nanos);
            true
        } else {
            false
        }
    }

    /// Nod cooldown state
    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    /// Clear the cooldown
    pub fn reset(&mut self) {
        self.cooldown.reset();
    }
}

/// Side-to-side head shake on the gyroscope Z axis
#[derive(Debug, Clone)]
pub struct ShakeDetector {
    threshold_dps: f64,
    window: usize,
    cooldown: Cooldown,
}

impl ShakeDetector {
    /// `window` is the number of gyroscope samples examined
    pub fn new(threshold_dps: f64, window: usize, cooldown: Cooldown) -> Self {
        Self {
            threshold_dps,
            window: window.max(1),
            cooldown,
        }
    }

    /// Samples examined per detection
    pub fn window(&self) -> usize {
        self.window
    }

    /// `gyro_z` is the gyroscope Z history, oldest first
    pub fn detect(&mut self, gyro_z: &[f64], now_nanos: u64) -> bool {
        if !self.cooldown.is_ready(now_nanos) || gyro_z.len() < self.window {
            return false;
        }

        let window = &gyro_z[gyro_z.len() - self.window..];
        let peak = window.iter().map(|v| v.abs()).fold(0.0, f64::max);
        if peak <= self.threshold_dps {
            return false;
        }

        let sign_changes = window
            .windows(2)
            .filter(|pair| sign(pair[0]) != sign(pair[1]))
            .count();

        if sign_changes >= motion::SHAKE_MIN_ZERO_CROSSINGS {
            self.cooldown.trigger(now_nanos);
            true
        } else {
            false
        }
    }

    /// Shake cooldown state
    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    /// Clear the cooldown
    pub fn reset(&mut self) {
        self.cooldown.reset();
    }
}

/// Direction of a detected head tilt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TiltDirection {
    /// Negative left/right tilt
    Left,
    /// Positive left/right tilt
    Right,
    /// Positive forward/backward tilt
    Forward,
    /// Negative forward/backward tilt
    Backward,
}

impl TiltDirection {
    /// Lowercase name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            TiltDirection::Left => "left",
            TiltDirection::Right => "right",
            TiltDirection::Forward => "forward",
            TiltDirection::Backward => "backward",
        }
    }
}

impl fmt::Display for TiltDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold crossing on the current head tilt
#[derive(Debug, Clone)]
pub struct TiltDetector {
    threshold: f64,
    cooldown: Cooldown,
}

impl TiltDetector {
    /// `threshold` applies to both tilt axes
    pub fn new(threshold: f64, cooldown: Cooldown) -> Self {
        Self { threshold, cooldown }
    }

    /// Left/right takes precedence over forward/backward
    pub fn detect(&mut self, left_right: f64, forward_backward: f64, now_nanos: u64) -> Option<TiltDirection> {
        if !self.cooldown.is_ready(now_nanos) {
            return None;
        }

        let direction = if left_right.abs() > self.threshold {
            if left_right < 0.0 {
                TiltDirection::Left
            } else {
                TiltDirection::Right
            }
        } else if forward_backward.abs() > self.threshold {
            if forward_backward > 0.0 {
                TiltDirection::Forward
            } else {
                TiltDirection::Backward
            }
        } else {
            return None;
        };

        self.cooldown.trigger(now_nanos);
        Some(direction)
    }

    /// Tilt cooldown state
    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    /// Clear the cooldown
    pub fn reset(&mut self) {
        self.cooldown.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: u64 = 1_000_000_000;

    #[test]
    fn test_cooldown() {
        let mut cooldown = Cooldown::from_secs(1.5).unwrap();
        assert!(cooldown.is_ready(0));

        cooldown.trigger(SEC);
        assert!(!cooldown.is_ready(2 * SEC));
        assert!(cooldown.is_ready(SEC + SEC * 3 / 2));

        cooldown.reset();
        assert!(cooldown.is_ready(SEC));
    }

    #[test]
    fn test_cooldown_rejects_unrepresentable_periods() {
        assert!(Cooldown::from_secs(f64::INFINITY).is_err());
        assert!(Cooldown::from_secs(f64::NAN).is_err());
        assert!(Cooldown::from_secs(-1.0).is_err());
        assert!(Cooldown::from_secs(0.0).unwrap().is_ready(0));
    }

    #[test]
    fn test_cooldown_saturates_long_periods() {
        let mut cooldown = Cooldown::new(Duration::MAX);
        cooldown.trigger(0);
        assert!(!cooldown.is_ready(u64::MAX - 1));
    }

    #[test]
    fn test_first_extrema_prefers_first() {
        assert_eq!(first_extrema(&[1.0, 0.0, 2.0, 0.0, 2.0]), (1, 2));
    }

    #[test]
    fn test_nod_requires_centred_extremum() {
        let mut detector = NodDetector::new(0.8, 10, Cooldown::from_secs(1.5).unwrap());

        // Monotonic ramp: extrema at the edges
        let ramp: Vec<f64> = (0..10).map(|i| i as f64 * 0.2).collect();
        assert!(!detector.detect(&ramp, 0));

        let mut bump = vec![0.0; 10];
        bump[5] = 1.0;
        assert!(detector.detect(&bump, 0));
        assert_eq!(detector.cooldown().last_trigger(), Some(0));
    }

    #[test]
    fn test_nod_too_few_samples() {
        let mut detector = NodDetector::new(0.8, 10, Cooldown::from_secs(1.5).unwrap());
        assert!(!detector.detect(&[0.0, 2.0, 0.0], 0));
        assert!(detector.cooldown().last_trigger().is_none());
    }

    #[test]
    fn test_shake_sign_changes() {
        let mut detector = ShakeDetector::new(150.0, 6, Cooldown::from_secs(1.5).unwrap());

        // One sign change only
        assert!(!detector.detect(&[200.0, 200.0, 200.0, -200.0, -200.0, -200.0], 0));
        assert!(detector.detect(&[200.0, -200.0, 200.0, 10.0, 10.0, 10.0], 0));
        // Cooling down
        assert!(!detector.detect(&[200.0, -200.0, 200.0, 10.0, 10.0, 10.0], SEC));
    }

    #[test]
    fn test_tilt_directions() {
        let mut detector = TiltDetector::new(0.3, Cooldown::from_secs(0.5).unwrap());
        assert_eq!(detector.detect(-0.5, 0.0, 0), Some(TiltDirection::Left));
        assert_eq!(detector.detect(0.5, 0.0, SEC / 4), None);
        assert_eq!(detector.detect(0.0, 0.5, SEC), Some(TiltDirection::Forward));
        assert_eq!(detector.detect(0.0, -0.5, 2 * SEC), Some(TiltDirection::Backward));
        assert_eq!(detector.detect(0.1, 0.1, 3 * SEC), None);
    }
}

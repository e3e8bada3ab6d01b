// src/processing/metrics.rs
//! Attention and relaxation indices relative to a calibration baseline

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::constants::metrics;
use crate::processing::calibration::CalibrationBaseline;
use crate::types::BandPowers;

/// `current / baseline`, or zero for a non-positive baseline
fn normalized(current: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        current / baseline
    } else {
        0.0
    }
}

/// Map a weighted ratio onto [0, 1]
fn unit_scale(ratio: f64) -> f64 {
    ratio.clamp(0.0, metrics::RATIO_CEILING) / metrics::RATIO_CEILING
}

/// Instantaneous attention: beta and gamma relative to baseline
pub fn raw_attention(current: &BandPowers, baseline: &BandPowers) -> f64 {
    unit_scale(
        metrics::ATTENTION_BETA_WEIGHT * normalized(current.beta, baseline.beta)
            + metrics::ATTENTION_GAMMA_WEIGHT * normalized(current.gamma, baseline.gamma),
    )
}

/// Instantaneous relaxation: alpha and theta relative to baseline
pub fn raw_relaxation(current: &BandPowers, baseline: &BandPowers) -> f64 {
    unit_scale(
        metrics::RELAXATION_ALPHA_WEIGHT * normalized(current.alpha, baseline.alpha)
            + metrics::RELAXATION_THETA_WEIGHT * normalized(current.theta, baseline.theta),
    )
}

/// Moving average over the last `capacity` values
#[derive(Debug, Clone)]
pub struct SmoothedMetric {
    history: VecDeque<f64>,
    capacity: usize,
}

impl SmoothedMetric {
    /// Empty history of at most `capacity` values (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a raw value and return the smoothed one
    pub fn update(&mut self, value: f64) -> f64 {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(value);
        self.value()
    }

    /// Mean of the history, neutral when empty
    pub fn value(&self) -> f64 {
        if self.history.is_empty() {
            metrics::NEUTRAL_METRIC
        } else {
            self.history.iter().sum::<f64>() / self.history.len() as f64
        }
    }

    /// Values currently averaged
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// True before the first update
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Forget every value
    pub fn clear(&mut self) {
        self.history.clear();
    }
}

/// Smoothed attention and relaxation state
#[derive(Debug, Clone)]
pub struct MetricEngine {
    attention: SmoothedMetric,
    relaxation: SmoothedMetric,
}

impl MetricEngine {
    /// Engine whose metrics average the last `history_len` values
    pub fn new(history_len: usize) -> Self {
        Self {
            attention: SmoothedMetric::new(history_len),
            relaxation: SmoothedMetric::new(history_len),
        }
    }

    /// Smoothed attention for `current`; 0.5 without a baseline or band powers.
    /// The neutral value does not enter the history.
    pub fn compute_attention(
        &mut self,
        current: Option<&BandPowers>,
        baseline: Option<&CalibrationBaseline>,
    ) -> f64 {
        match (current, baseline) {
            (Some(current), Some(baseline)) => {
                self.attention.update(raw_attention(current, &baseline.powers))
            }
            _ => metrics::NEUTRAL_METRIC,
        }
    }

    /// Smoothed relaxation for `current`; 0.5 without a baseline or band powers
    pub fn compute_relaxation(
        &mut self,
        current: Option<&BandPowers>,
        baseline: Option<&CalibrationBaseline>,
    ) -> f64 {
        match (current, baseline) {
            (Some(current), Some(baseline)) => {
                self.relaxation.update(raw_relaxation(current, &baseline.powers))
            }
            _ => metrics::NEUTRAL_METRIC,
        }
    }

    /// Clear both histories
    pub fn reset(&mut self) {
        self.attention.clear();
        self.relaxation.clear();
    }
}

/// Attention/relaxation values with the band powers they came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValues {
    /// Smoothed attention
    pub attention: f64,
    /// Smoothed relaxation
    pub relaxation: f64,
    /// Averaged band powers of the last analysis
    pub band_powers: BandPowers,
    /// A baseline is installed
    pub is_calibrated: bool,
}

impl Default for MetricValues {
    fn default() -> Self {
        Self {
            attention: metrics::NEUTRAL_METRIC,
            relaxation: metrics::NEUTRAL_METRIC,
            band_powers: BandPowers::default(),
            is_calibrated: false,
        }
    }
}

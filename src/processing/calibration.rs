// src/processing/calibration.rs
//! Resting-state baseline capture
//!
//! A baseline is the per-band median of band power samples gathered while
//! the wearer sits still. Calibration never fails: when nothing usable was
//! collected the documented fallback map is used instead.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::constants::metrics;
use crate::types::{BandMap, BandPowers};
use crate::utils::stats::median;

/// Per-band reference power
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBaseline {
    /// Median power per band (µV²)
    pub powers: BandPowers,
    /// True when calibration collected nothing and defaults were used
    pub used_fallback: bool,
}

impl CalibrationBaseline {
    /// Default baseline: delta 100, theta 50, alpha 30, beta 20, gamma 10 (µV²)
    pub fn fallback() -> Self {
        Self {
            powers: BandMap {
                delta: metrics::FALLBACK_DELTA,
                theta: metrics::FALLBACK_THETA,
                alpha: metrics::FALLBACK_ALPHA,
                beta: metrics::FALLBACK_BETA,
                gamma: metrics::FALLBACK_GAMMA,
            },
            used_fallback: true,
        }
    }

    /// Explicit baseline, e.g. a single resting measurement
    pub fn from_powers(powers: BandPowers) -> Self {
        Self {
            powers,
            used_fallback: false,
        }
    }
}

/// Number of samples and their spacing for a blocking calibration run
pub fn calibration_schedule(duration: Duration) -> (usize, Duration) {
    // `as` saturates, so huge durations land on the u32 cap
    let by_rate = (duration.as_secs_f64() * metrics::CALIBRATION_SAMPLING_HZ) as u32;
    let count = by_rate.max(metrics::MIN_CALIBRATION_SAMPLES as u32);
    (count as usize, duration / count)
}

/// Incremental collection of band power samples
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    collected: BandMap<Vec<f64>>,
    samples_taken: usize,
    /// `None` when the deadline is past what `Instant` can represent
    deadline: Option<Instant>,
    sample_interval: Duration,
    last_sample: Option<Instant>,
}

impl CalibrationSession {
    /// Session open from `started` for `duration`, sampling at most once per `sample_interval`
    pub fn new(started: Instant, duration: Duration, sample_interval: Duration) -> Self {
        debug!("Calibration started for {:.1}s", duration.as_secs_f64());
        Self {
            collected: BandMap::default(),
            samples_taken: 0,
            deadline: started.checked_add(duration),
            sample_interval,
            last_sample: None,
        }
    }

    /// Whether a new sample is due at `now`
    pub fn sample_due(&self, now: Instant) -> bool {
        match self.last_sample {
            None => true,
            Some(last) => now.duration_since(last) >= self.sample_interval,
        }
    }

    /// True once the calibration deadline has passed
    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Record one band power measurement. Only strictly positive values are kept.
    pub fn record(&mut self, powers: &BandPowers, now: Instant) {
        for (band, &value) in powers.iter() {
            if value > 0.0 {
                self.collected.get_mut(band).push(value);
            }
        }
        self.samples_taken += 1;
        self.last_sample = Some(now);
    }

    /// Samples recorded so far
    pub fn samples_taken(&self) -> usize {
        self.samples_taken
    }

    /// Close the session and derive the baseline.
    ///
    /// Bands that collected nothing stay at zero; if every band is empty the
    /// fallback baseline is returned.
    pub fn finish(self) -> CalibrationBaseline {
        if self.collected.iter().all(|(_, values)| values.is_empty()) {
            warn!(
                "Calibration gathered no usable data over {} samples, using fallback baseline",
                self.samples_taken
            );
            return CalibrationBaseline::fallback();
        }

        let powers = self.collected.map(|_, values| {
            if values.is_empty() {
                0.0
            } else {
                median(values)
            }
        });
        debug!(
            "Calibration complete: delta {:.2}, theta {:.2}, alpha {:.2}, beta {:.2}, gamma {:.2}",
            powers.delta, powers.theta, powers.alpha, powers.beta, powers.gamma
        );
        CalibrationBaseline::from_powers(powers)
    }
}

/// Blocking calibration: call `sampler` roughly twice per second for `duration`
pub fn calibrate<F>(duration: Duration, mut sampler: F) -> CalibrationBaseline
where
    F: FnMut() -> BandPowers,
{
    let (count, spacing) = calibration_schedule(duration);
    let mut session = CalibrationSession::new(Instant::now(), duration, Duration::ZERO);

    for _ in 0..count {
        let powers = sampler();
        session.record(&powers, Instant::now());
        if !spacing.is_zero() {
            std::thread::sleep(spacing);
        }
    }

    session.finish()
}

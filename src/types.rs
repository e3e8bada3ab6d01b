// src/types.rs
//! Core value types shared by the processing stages

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::constants::spectral;

/// EEG frequency band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// Deep sleep
    Delta,
    /// Meditation, drowsiness
    Theta,
    /// Relaxation, eyes closed
    Alpha,
    /// Active attention, concentration
    Beta,
    /// Cognitive processing
    Gamma,
}

impl Band {
    /// All bands in ascending frequency order
    pub const ALL: [Band; 5] = [Band::Delta, Band::Theta, Band::Alpha, Band::Beta, Band::Gamma];

    /// Lowercase band name
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Gamma => "gamma",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per EEG band.
///
/// Used for band powers (`BandMap<f64>`), per-channel band powers
/// (`BandMap<Vec<f64>>`) and the frequency band table
/// (`BandMap<FrequencyBand>`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandMap<T> {
    /// 1–4 Hz
    pub delta: T,
    /// 4–8 Hz
    pub theta: T,
    /// 8–13 Hz
    pub alpha: T,
    /// 13–30 Hz
    pub beta: T,
    /// 30–44 Hz
    pub gamma: T,
}

impl<T> BandMap<T> {
    /// Build a map by evaluating `f` for every band
    pub fn from_fn(mut f: impl FnMut(Band) -> T) -> Self {
        Self {
            delta: f(Band::Delta),
            theta: f(Band::Theta),
            alpha: f(Band::Alpha),
            beta: f(Band::Beta),
            gamma: f(Band::Gamma),
        }
    }

    /// Value for `band`
    pub fn get(&self, band: Band) -> &T {
        match band {
            Band::Delta => &self.delta,
            Band::Theta => &self.theta,
            Band::Alpha => &self.alpha,
            Band::Beta => &self.beta,
            Band::Gamma => &self.gamma,
        }
    }

    /// Mutable value for `band`
    pub fn get_mut(&mut self, band: Band) -> &mut T {
        match band {
            Band::Delta => &mut self.delta,
            Band::Theta => &mut self.theta,
            Band::Alpha => &mut self.alpha,
            Band::Beta => &mut self.beta,
            Band::Gamma => &mut self.gamma,
        }
    }

    /// Iterate `(band, value)` pairs in ascending frequency order
    pub fn iter(&self) -> impl Iterator<Item = (Band, &T)> + '_ {
        Band::ALL.into_iter().map(move |band| (band, self.get(band)))
    }

    /// Transform every value
    pub fn map<U>(&self, mut f: impl FnMut(Band, &T) -> U) -> BandMap<U> {
        BandMap::from_fn(|band| f(band, self.get(band)))
    }
}

/// Band power averaged across channels (µV²)
pub type BandPowers = BandMap<f64>;

/// Band power per channel, `band -> [power_per_channel]`
pub type ChannelBandPowers = BandMap<Vec<f64>>;

impl BandPowers {
    /// Sum of all band powers
    pub fn total(&self) -> f64 {
        self.iter().map(|(_, v)| *v).sum()
    }

    /// True when at least one band carries power
    pub fn has_power(&self) -> bool {
        self.iter().any(|(_, v)| *v != 0.0)
    }
}

impl ChannelBandPowers {
    /// Explicit zero vector for every band
    pub fn zeros(channel_count: usize) -> Self {
        BandMap::from_fn(|_| vec![0.0; channel_count])
    }

    /// Number of channels carried per band
    pub fn channel_count(&self) -> usize {
        self.delta.len()
    }
}

/// Frequency interval `[low_hz, high_hz]` in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    /// Lower edge, inclusive
    pub low_hz: f64,
    /// Upper edge, inclusive
    pub high_hz: f64,
}

impl FrequencyBand {
    /// Band from `low_hz` to `high_hz`
    pub const fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }

    /// Inclusive on both ends
    pub fn contains(&self, freq_hz: f64) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }
}

/// The frequency band table used for analysis
pub type BandTable = BandMap<FrequencyBand>;

impl BandTable {
    /// Standard EEG bands: delta 1–4, theta 4–8, alpha 8–13, beta 13–30, gamma 30–44 Hz
    pub fn standard() -> Self {
        let pair = |(low, high): (f64, f64)| FrequencyBand::new(low, high);
        Self {
            delta: pair(spectral::DELTA_HZ),
            theta: pair(spectral::THETA_HZ),
            alpha: pair(spectral::ALPHA_HZ),
            beta: pair(spectral::BETA_HZ),
            gamma: pair(spectral::GAMMA_HZ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_map_indexing() {
        let mut powers = BandPowers::default();
        *powers.get_mut(Band::Alpha) = 3.0;
        assert_eq!(powers.alpha, 3.0);
        assert_eq!(*powers.get(Band::Alpha), 3.0);
        assert!(powers.has_power());
        assert_eq!(powers.total(), 3.0);
    }

    #[test]
    fn test_band_iteration_order() {
        let table = BandTable::standard();
        let lows: Vec<f64> = table.iter().map(|(_, b)| b.low_hz).collect();
        assert_eq!(lows, vec![1.0, 4.0, 8.0, 13.0, 30.0]);
    }

    #[test]
    fn test_frequency_band_is_inclusive() {
        let alpha = BandTable::standard().alpha;
        assert!(alpha.contains(8.0));
        assert!(alpha.contains(13.0));
        assert!(!alpha.contains(13.5));
    }

    #[test]
    fn test_channel_zeros() {
        let zeros = ChannelBandPowers::zeros(4);
        assert_eq!(zeros.channel_count(), 4);
        assert!(zeros.iter().all(|(_, v)| v.iter().all(|&p| p == 0.0)));
    }
}

// src/processing/processor.rs
//! Single-owner EEG analysis state: buffers, spectra, baseline and metrics

use std::time::Duration;

use ndarray::ArrayView2;
use tracing::{debug, info};

use crate::acquisition::MultiChannelBuffer;
use crate::config::constants::signal;
use crate::config::{validate_eeg_config, EegConfig};
use crate::error::{BrainwaveError, BrainwaveResult};
use crate::processing::calibration::{self, CalibrationBaseline};
use crate::processing::metrics::{MetricEngine, MetricValues};
use crate::processing::spectral::SpectralEngine;
use crate::types::{BandPowers, ChannelBandPowers};

/// Output of one analysis cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Channel-averaged band powers
    pub band_powers: BandPowers,
    /// Band powers of each channel
    pub band_powers_per_channel: ChannelBandPowers,
    /// Smoothed attention
    pub attention: f64,
    /// Smoothed relaxation
    pub relaxation: f64,
    /// A baseline is installed
    pub is_calibrated: bool,
}

/// EEG processing engine for one 4-channel stream
pub struct EegProcessor {
    config: EegConfig,
    buffers: MultiChannelBuffer,
    spectral: SpectralEngine,
    metric_engine: MetricEngine,
    baseline: Option<CalibrationBaseline>,
    current_bands: Option<BandPowers>,
    current_attention: f64,
    current_relaxation: f64,
}

impl EegProcessor {
    /// Validate `config` and allocate the channel buffers
    pub fn new(config: EegConfig) -> BrainwaveResult<Self> {
        let mut errors = Vec::new();
        validate_eeg_config(&config, &mut errors);
        if !errors.is_empty() {
            return Err(BrainwaveError::configuration("eeg", errors.join("; ")));
        }

        let buffers = MultiChannelBuffer::new(signal::EEG_CHANNEL_COUNT, config.buffer_capacity())
            .map_err(|e| BrainwaveError::configuration("eeg", e.to_string()))?;
        let spectral = SpectralEngine::new(&config);
        let metric_engine = MetricEngine::new(config.smoothing_history);

        debug!(
            "EEG processor ready: {} Hz, window {} samples, notch {} Hz",
            config.sample_rate_hz, config.window_size, config.mains_frequency_hz
        );

        Ok(Self {
            config,
            buffers,
            spectral,
            metric_engine,
            baseline: None,
            current_bands: None,
            current_attention: 0.0,
            current_relaxation: 0.0,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &EegConfig {
        &self.config
    }

    /// Append a `[samples, channels]` block; only the first four channels are kept
    pub fn add_data(&mut self, block: ArrayView2<'_, f64>) {
        self.buffers.append_block(block);
    }

    /// Samples buffered on channel 0
    pub fn buffered_samples(&self) -> usize {
        self.buffers.channel(0).map_or(0, |ch| ch.len())
    }

    /// Channel history
    pub fn buffers(&self) -> &MultiChannelBuffer {
        &self.buffers
    }

    /// Channel-averaged band powers; becomes the current band set
    pub fn compute_band_powers(&mut self) -> BandPowers {
        let powers = self.spectral.compute_band_powers(&self.buffers);
        self.current_bands = Some(powers);
        powers
    }

    /// Band powers of each channel, zero for short channels
    pub fn compute_band_powers_per_channel(&mut self) -> ChannelBandPowers {
        self.spectral.compute_band_powers_per_channel(&self.buffers)
    }

    /// Smoothed attention from the current band set, 0.5 before calibration
    pub fn compute_attention(&mut self) -> f64 {
        let value = self
            .metric_engine
            .compute_attention(self.current_bands.as_ref(), self.baseline.as_ref());
        if self.ready_for_metrics() {
            self.current_attention = value;
        }
        value
    }

    /// Smoothed relaxation from the current band set, 0.5 before calibration
    pub fn compute_relaxation(&mut self) -> f64 {
        let value = self
            .metric_engine
            .compute_relaxation(self.current_bands.as_ref(), self.baseline.as_ref());
        if self.ready_for_metrics() {
            self.current_relaxation = value;
        }
        value
    }

    fn ready_for_metrics(&self) -> bool {
        self.baseline.is_some() && self.current_bands.is_some()
    }

    /// Run one full analysis cycle over the buffered data
    pub fn analyze(&mut self) -> Analysis {
        let band_powers = self.compute_band_powers();
        let band_powers_per_channel = self.compute_band_powers_per_channel();
        let attention = self.compute_attention();
        let relaxation = self.compute_relaxation();

        Analysis {
            band_powers,
            band_powers_per_channel,
            attention,
            relaxation,
            is_calibrated: self.is_calibrated(),
        }
    }

    /// Blocking calibration over the data already buffered.
    ///
    /// Samples band powers about twice per second for `duration`. The
    /// processor is calibrated afterwards even if only the fallback baseline
    /// could be used.
    pub fn calibrate(&mut self, duration: Duration) -> CalibrationBaseline {
        info!("Calibrating for {:.1}s", duration.as_secs_f64());
        let baseline = calibration::calibrate(duration, || self.compute_band_powers());
        self.baseline = Some(baseline);
        baseline
    }

    /// Install a baseline directly and mark the processor calibrated
    pub fn set_baseline(&mut self, baseline: CalibrationBaseline) {
        debug!("Baseline set (fallback: {})", baseline.used_fallback);
        self.baseline = Some(baseline);
    }

    /// Installed baseline, if any
    pub fn baseline(&self) -> Option<&CalibrationBaseline> {
        self.baseline.as_ref()
    }

    /// True once a baseline is installed
    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    /// Current values without advancing the smoothing histories
    pub fn metrics(&self) -> MetricValues {
        MetricValues {
            attention: self.current_attention,
            relaxation: self.current_relaxation,
            band_powers: self.current_bands.unwrap_or_default(),
            is_calibrated: self.is_calibrated(),
        }
    }

    /// Drop all buffered data, the baseline, metric histories and cached spectra
    pub fn reset(&mut self) {
        self.buffers.clear();
        self.baseline = None;
        self.metric_engine.reset();
        self.current_bands = None;
        self.current_attention = 0.0;
        self.current_relaxation = 0.0;
        self.spectral.clear_cache();
        debug!("EEG processor reset");
    }

    /// Drop memoized spectra
    pub fn clear_spectrum_cache(&mut self) {
        self.spectral.clear_cache();
    }

    /// Entries held by the spectrum cache
    pub fn spectrum_cache_len(&self) -> usize {
        self.spectral.cache_len()
    }
}

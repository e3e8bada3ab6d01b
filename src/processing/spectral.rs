// src/processing/spectral.rs
//! FFT-based band power extraction
//!
//! Each analysis cycle takes the most recent window of every channel,
//! removes the linear trend, suppresses mains interference, applies a Hann
//! taper and averages the one-sided power bins falling inside each band.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use tracing::{debug, trace};

use crate::acquisition::MultiChannelBuffer;
use crate::config::constants::signal;
use crate::config::EegConfig;
use crate::processing::filters::NotchFilter;
use crate::processing::windowing::{
    apply_window, detrend_constant, detrend_linear, hann_window, hann_window_periodic,
};
use crate::types::{BandMap, BandPowers, BandTable, ChannelBandPowers};

/// One-sided power spectrum
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Bin frequencies in Hz
    pub freqs: Vec<f64>,
    /// Power per bin
    pub power: Vec<f64>,
}

impl Spectrum {
    /// Mean bin power for `low <= f <= high`, zero when no bin qualifies
    pub fn mean_power_between(&self, low_hz: f64, high_hz: f64) -> f64 {
        let (sum, count) = self
            .freqs
            .iter()
            .zip(&self.power)
            .filter(|&(&f, _)| f >= low_hz && f <= high_hz)
            .fold((0.0, 0usize), |(sum, count), (_, &p)| (sum + p, count + 1));

        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Band power for every band of `table`
    pub fn band_powers(&self, table: &BandTable) -> BandPowers {
        table.map(|_, range| self.mean_power_between(range.low_hz, range.high_hz))
    }
}

/// Memoization strategy for spectra of identical windows
pub trait SpectrumCache: Send {
    /// Spectrum previously stored for exactly this `window` on `channel`
    fn get(&mut self, channel: usize, window: &[f64]) -> Option<Arc<Spectrum>>;
    /// Store the spectrum of `window` on `channel`
    fn insert(&mut self, channel: usize, window: &[f64], spectrum: Arc<Spectrum>);
    /// Drop every entry
    fn clear(&mut self);
    /// Entries currently held
    fn len(&self) -> usize;

    /// True when nothing is cached
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache that never stores anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpectrumCache;

impl SpectrumCache for NoSpectrumCache {
    fn get(&mut self, _channel: usize, _window: &[f64]) -> Option<Arc<Spectrum>> {
        None
    }

    fn insert(&mut self, _channel: usize, _window: &[f64], _spectrum: Arc<Spectrum>) {}

    fn clear(&mut self) {}

    fn len(&self) -> usize {
        0
    }
}

type CacheKey = (usize, u64);

struct CacheEntry {
    window: Vec<f64>,
    spectrum: Arc<Spectrum>,
}

/// FIFO-bounded cache keyed by channel and window content hash
pub struct BoundedSpectrumCache {
    capacity: usize,
    entries: HashMap<CacheKey, CacheEntry>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl BoundedSpectrumCache {
    /// FIFO cache of at most `capacity` spectra
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Lookups answered from the cache
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that computed a new spectrum
    pub fn misses(&self) -> u64 {
        self.misses
    }

    fn key(channel: usize, window: &[f64]) -> CacheKey {
        let mut hasher = DefaultHasher::new();
        for sample in window {
            sample.to_bits().hash(&mut hasher);
        }
        (channel, hasher.finish())
    }
}

fn same_bits(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

impl SpectrumCache for BoundedSpectrumCache {
    fn get(&mut self, channel: usize, window: &[f64]) -> Option<Arc<Spectrum>> {
        let key = Self::key(channel, window);
        match self.entries.get(&key) {
            Some(entry) if same_bits(&entry.window, window) => {
                self.hits += 1;
                trace!("Spectrum cache hit for channel {}", channel);
                Some(Arc::clone(&entry.spectrum))
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    fn insert(&mut self, channel: usize, window: &[f64], spectrum: Arc<Spectrum>) {
        let key = Self::key(channel, window);
        let entry = CacheEntry {
            window: window.to_vec(),
            spectrum,
        };

        if self.entries.insert(key, entry).is_some() {
            // Replaced a colliding entry in place; FIFO position unchanged
            return;
        }
        self.order.push_back(key);

        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Band power estimator for the analysed EEG channels
pub struct SpectralEngine {
    sample_rate: f64,
    window_size: usize,
    bands: BandTable,
    notch: Option<NotchFilter>,
    taper: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
    freqs: Vec<f64>,
    cache: Box<dyn SpectrumCache>,
}

impl SpectralEngine {
    /// Build an engine from configuration. An invalid notch design disables
    /// the notch stage instead of failing.
    pub fn new(config: &EegConfig) -> Self {
        let notch = match NotchFilter::new(
            config.mains_frequency_hz,
            config.notch_quality_factor,
            config.sample_rate_hz,
        ) {
            Ok(filter) => Some(filter),
            Err(e) => {
                debug!("Notch stage disabled: {}", e);
                None
            }
        };

        let cache: Box<dyn SpectrumCache> = if config.enable_fft_cache {
            Box::new(BoundedSpectrumCache::new(config.fft_cache_capacity))
        } else {
            Box::new(NoSpectrumCache)
        };

        Self::with_cache(config, notch, cache)
    }

    /// Build an engine with an explicit notch stage and cache strategy
    pub fn with_cache(config: &EegConfig, notch: Option<NotchFilter>, cache: Box<dyn SpectrumCache>) -> Self {
        let window_size = config.window_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(window_size);

        let bin_width = config.sample_rate_hz / window_size as f64;
        let freqs = (1..=window_size.saturating_sub(1) / 2)
            .map(|k| k as f64 * bin_width)
            .collect();

        Self {
            sample_rate: config.sample_rate_hz,
            window_size,
            bands: config.bands,
            notch,
            taper: hann_window(window_size),
            fft,
            freqs,
            cache,
        }
    }

    /// Samples per analysis window
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Sample rate (Hz)
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Band table in use
    pub fn bands(&self) -> &BandTable {
        &self.bands
    }

    /// Entries currently held by the spectrum cache
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop every memoized spectrum
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Band powers averaged over the analysed channels.
    ///
    /// Channels without a full window contribute zero, yet the sum is always
    /// divided by the full channel count. When channel 0 is short the whole
    /// result is zero.
    pub fn compute_band_powers(&mut self, buffers: &MultiChannelBuffer) -> BandPowers {
        let per_channel = self.compute_band_powers_per_channel(buffers);
        let divisor = signal::EEG_CHANNEL_COUNT as f64;
        per_channel.map(|_, powers| powers.iter().sum::<f64>() / divisor)
    }

    /// Band powers per channel; short channels report an explicit zero
    pub fn compute_band_powers_per_channel(&mut self, buffers: &MultiChannelBuffer) -> ChannelBandPowers {
        let channel_count = signal::EEG_CHANNEL_COUNT;
        let mut result = ChannelBandPowers::zeros(channel_count);

        let reference_ready = buffers
            .channel(0)
            .map_or(false, |ch| ch.len() >= self.window_size);
        if !reference_ready {
            return result;
        }

        for channel in 0..channel_count {
            let Some(window) = buffers.channel(channel).and_then(|ch| ch.latest(self.window_size)) else {
                continue;
            };

            let powers = self.analyze_window(channel, &window);
            for (band, value) in powers.iter() {
                result.get_mut(band)[channel] = *value;
            }
        }

        result
    }

    /// Band powers of one raw window of exactly `window_size` samples
    pub fn analyze_window(&mut self, channel: usize, samples: &[f64]) -> BandPowers {
        if samples.len() != self.window_size {
            return BandMap::default();
        }
        self.power_spectrum(channel, samples).band_powers(&self.bands)
    }

    /// One-sided power spectrum of a raw window after detrend, notch and taper
    pub fn power_spectrum(&mut self, channel: usize, samples: &[f64]) -> Arc<Spectrum> {
        let mut window = detrend_linear(samples);

        if let Some(notch) = &self.notch {
            match notch.filtfilt(&window) {
                Ok(filtered) => window = filtered,
                Err(e) => trace!("Notch filter skipped on channel {}: {}", channel, e),
            }
        }

        apply_window(&mut window, &self.taper);

        if let Some(spectrum) = self.cache.get(channel, &window) {
            return spectrum;
        }

        let spectrum = Arc::new(self.fft_power(&window));
        self.cache.insert(channel, &window, Arc::clone(&spectrum));
        spectrum
    }

    fn fft_power(&self, window: &[f64]) -> Spectrum {
        let n = window.len();
        let mut buffer: Vec<Complex<f64>> = window.iter().map(|&x| Complex::new(x, 0.0)).collect();
        self.fft.process(&mut buffer);

        let norm = 1.0 / (n as f64).powi(2);
        let power = buffer[1..=self.freqs.len()]
            .iter()
            .map(|c| c.norm_sqr() * norm)
            .collect();

        Spectrum {
            freqs: self.freqs.clone(),
            power,
        }
    }
}

/// Welch power spectral density estimate.
///
/// Periodic Hann segments of `segment_len` samples with 50% overlap, each
/// mean-detrended, averaged periodograms scaled as a one-sided density
/// (units²/Hz). Returns an empty spectrum when `data` is shorter than one
/// segment.
pub fn welch_psd(data: &[f64], sample_rate: f64, segment_len: usize) -> Spectrum {
    let empty = Spectrum { freqs: Vec::new(), power: Vec::new() };
    if segment_len == 0 || data.len() < segment_len {
        return empty;
    }

    let step = segment_len - segment_len / 2;
    let window = hann_window_periodic(segment_len);
    let scale = 1.0 / (sample_rate * window.iter().map(|w| w * w).sum::<f64>());
    let bins = segment_len / 2 + 1;

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(segment_len);
    let mut accumulated = vec![0.0; bins];
    let mut segments = 0usize;

    let mut start = 0;
    while start + segment_len <= data.len() {
        let mut segment = detrend_constant(&data[start..start + segment_len]);
        apply_window(&mut segment, &window);

        let mut buffer: Vec<Complex<f64>> = segment.iter().map(|&x| Complex::new(x, 0.0)).collect();
        fft.process(&mut buffer);
        for (acc, c) in accumulated.iter_mut().zip(&buffer) {
            *acc += c.norm_sqr() * scale;
        }

        segments += 1;
        start += step;
    }

    // Fold negative frequencies in; DC and (for even lengths) Nyquist appear once
    let last_doubled = if segment_len % 2 == 0 { bins - 1 } else { bins };
    let power = accumulated
        .iter()
        .enumerate()
        .map(|(k, &p)| {
            let p = p / segments as f64;
            if k > 0 && k < last_doubled {
                2.0 * p
            } else {
                p
            }
        })
        .collect();

    let bin_width = sample_rate / segment_len as f64;
    Spectrum {
        freqs: (0..bins).map(|k| k as f64 * bin_width).collect(),
        power,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::f64::consts::PI;

    fn sine_block(freq: f64, amplitude: f64, rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(i, _)| {
            amplitude * (2.0 * PI * freq * i as f64 / 256.0).sin()
        })
    }

    fn filled_buffers(block: &Array2<f64>) -> MultiChannelBuffer {
        let config = EegConfig::default();
        let mut buffers = MultiChannelBuffer::new(signal::EEG_CHANNEL_COUNT, config.buffer_capacity()).unwrap();
        buffers.append_block(block.view());
        buffers
    }

    #[test]
    fn test_bin_layout() {
        let engine = SpectralEngine::new(&EegConfig::default());
        assert_eq!(engine.freqs.len(), 31);
        assert_eq!(engine.freqs[0], 4.0);
        assert_eq!(engine.freqs[30], 124.0);
    }

    #[test]
    fn test_band_mean_is_inclusive() {
        let spectrum = Spectrum {
            freqs: vec![4.0, 8.0, 12.0, 16.0],
            power: vec![1.0, 2.0, 4.0, 8.0],
        };
        assert_eq!(spectrum.mean_power_between(8.0, 13.0), 3.0);
        assert_eq!(spectrum.mean_power_between(4.0, 8.0), 1.5);
        assert_eq!(spectrum.mean_power_between(50.0, 60.0), 0.0);
    }

    #[test]
    fn test_alpha_sinusoid_dominates() {
        let mut engine = SpectralEngine::new(&EegConfig::default());
        let buffers = filled_buffers(&sine_block(10.0, 20.0, 128, 4));

        let powers = engine.compute_band_powers(&buffers);
        assert!(powers.alpha > powers.beta);
        assert!(powers.alpha > powers.delta);
    }

    #[test]
    fn test_short_reference_channel_yields_zero() {
        let mut engine = SpectralEngine::new(&EegConfig::default());
        let buffers = filled_buffers(&sine_block(10.0, 20.0, 32, 4));

        assert_eq!(engine.compute_band_powers(&buffers), BandPowers::default());
        let per_channel = engine.compute_band_powers_per_channel(&buffers);
        assert_eq!(per_channel.channel_count(), 4);
        assert!(per_channel.iter().all(|(_, v)| v.iter().all(|&p| p == 0.0)));
    }

    #[test]
    fn test_missing_channels_reported_as_zero() {
        let mut engine = SpectralEngine::new(&EegConfig::default());
        let buffers = filled_buffers(&sine_block(10.0, 20.0, 64, 2));

        let per_channel = engine.compute_band_powers_per_channel(&buffers);
        assert!(per_channel.alpha[0] > 0.0);
        assert!(per_channel.alpha[1] > 0.0);
        assert_eq!(per_channel.alpha[2], 0.0);
        assert_eq!(per_channel.alpha[3], 0.0);

        // Still divided by four
        let averaged = engine.compute_band_powers(&buffers);
        let expected = (per_channel.alpha[0] + per_channel.alpha[1]) / 4.0;
        assert!((averaged.alpha - expected).abs() < 1e-12);
    }

    #[test]
    fn test_cache_is_transparent() {
        let mut config = EegConfig::default();
        let block = sine_block(12.0, 15.0, 64, 4);
        let buffers = filled_buffers(&block);

        let mut plain = SpectralEngine::new(&config);
        config.enable_fft_cache = true;
        let mut cached = SpectralEngine::new(&config);

        let first = cached.compute_band_powers(&buffers);
        // All four channels carry the same window but keys include the channel
        assert_eq!(cached.cache_len(), 4);
        let second = cached.compute_band_powers(&buffers);
        assert_eq!(cached.cache_len(), 4);

        assert_eq!(first, second);
        assert_eq!(first, plain.compute_band_powers(&buffers));

        cached.clear_cache();
        assert_eq!(cached.cache_len(), 0);
    }

    #[test]
    fn test_bounded_cache_evicts_fifo() {
        let mut cache = BoundedSpectrumCache::new(2);
        let spectrum = Arc::new(Spectrum { freqs: vec![1.0], power: vec![1.0] });

        cache.insert(0, &[1.0], Arc::clone(&spectrum));
        cache.insert(0, &[2.0], Arc::clone(&spectrum));
        cache.insert(0, &[3.0], Arc::clone(&spectrum));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(0, &[1.0]).is_none());
        assert!(cache.get(0, &[2.0]).is_some());
        assert!(cache.get(1, &[2.0]).is_none());
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_short_window_without_notch_still_analysed() {
        let mut config = EegConfig::default();
        config.window_size = 8;
        let mut engine = SpectralEngine::new(&config);

        // 8 samples is below the zero-phase padding requirement; the notch is skipped
        let samples: Vec<f64> = (0..8).map(|i| (i as f64 * 1.3).sin()).collect();
        let powers = engine.analyze_window(0, &samples);
        assert!(powers.iter().all(|(_, &p)| p >= 0.0));
        assert!(powers.has_power());
    }

    #[test]
    fn test_welch_locates_peak() {
        let data: Vec<f64> = (0..512)
            .map(|i| 10.0 * (2.0 * PI * 10.0 * i as f64 / 256.0).sin())
            .collect();
        let psd = welch_psd(&data, 256.0, 256);

        assert_eq!(psd.freqs.len(), 129);
        assert_eq!(psd.freqs[10], 10.0);
        let peak = psd
            .power
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (k, &p)| if p > best.1 { (k, p) } else { best });
        assert_eq!(peak.0, 10);
    }

    #[test]
    fn test_welch_parseval() {
        // Density integrates to the (Hann-weighted) signal power: A²/2 for a sinusoid
        let data: Vec<f64> = (0..1024)
            .map(|i| 4.0 * (2.0 * PI * 32.0 * i as f64 / 256.0).sin())
            .collect();
        let psd = welch_psd(&data, 256.0, 256);
        // 1 Hz bins
        let total: f64 = psd.power.iter().sum();
        assert!((total - 8.0).abs() < 0.1);
    }

    #[test]
    fn test_welch_short_input() {
        assert!(welch_psd(&[1.0; 10], 256.0, 16).power.is_empty());
    }
}

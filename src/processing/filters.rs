// src/processing/filters.rs
//! Mains-interference notch filter with zero-phase application

use std::f64::consts::PI;

use thiserror::Error;

/// Filter design and application errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FilterError {
    /// Center frequency, Q or sample rate out of range
    #[error("Invalid filter parameters: {0}")]
    InvalidParameters(String),

    /// Input not longer than the filtfilt padding
    #[error("Zero-phase filtering needs more than {need} samples, got {got}")]
    InsufficientSamples { got: usize, need: usize },
}

/// Second-order IIR notch (band-stop) filter.
///
/// Coefficients follow the standard bilinear notch design: with
/// `w0 = 2π·f0/fs` and bandwidth `bw = w0/Q`,
/// `b = g·[1, −2cos w0, 1]` and `a = [1, −2g·cos w0, 2g − 1]`
/// where `g = 1 / (1 + tan(bw/2))`.
#[derive(Debug, Clone, PartialEq)]
pub struct NotchFilter {
    b: [f64; 3],
    a: [f64; 3],
    center_freq: f64,
    q_factor: f64,
}

impl NotchFilter {
    /// Design a notch at `center_freq` Hz for a stream sampled at `sample_rate` Hz
    pub fn new(center_freq: f64, q_factor: f64, sample_rate: f64) -> Result<Self, FilterError> {
        if sample_rate <= 0.0 {
            return Err(FilterError::InvalidParameters(format!(
                "sample rate must be positive, got {}",
                sample_rate
            )));
        }
        let nyquist = sample_rate / 2.0;
        if center_freq <= 0.0 || center_freq >= nyquist {
            return Err(FilterError::InvalidParameters(format!(
                "notch frequency {} Hz must lie in (0, {}) Hz",
                center_freq, nyquist
            )));
        }
        if q_factor <= 0.0 {
            return Err(FilterError::InvalidParameters(format!(
                "quality factor must be positive, got {}",
                q_factor
            )));
        }

        let w0 = PI * center_freq / nyquist;
        let bandwidth = w0 / q_factor;
        let beta = (bandwidth / 2.0).tan();
        let gain = 1.0 / (1.0 + beta);
        let cos_w0 = w0.cos();

        Ok(Self {
            b: [gain, -2.0 * gain * cos_w0, gain],
            a: [1.0, -2.0 * gain * cos_w0, 2.0 * gain - 1.0],
            center_freq,
            q_factor,
        })
    }

    /// `(b, a)` normalized so `a[0] == 1`
    pub fn coefficients(&self) -> (&[f64; 3], &[f64; 3]) {
        (&self.b, &self.a)
    }

    /// Notch frequency (Hz)
    pub fn center_freq(&self) -> f64 {
        self.center_freq
    }

    /// Quality factor
    pub fn q_factor(&self) -> f64 {
        self.q_factor
    }

    /// Edge padding used by `filtfilt`
    pub fn pad_len(&self) -> usize {
        3 * self.a.len().max(self.b.len())
    }

    /// Causal direct-form II transposed filtering starting from state `zi`
    pub fn lfilter(&self, input: &[f64], zi: [f64; 2]) -> Vec<f64> {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        let [mut z0, mut z1] = zi;

        input
            .iter()
            .map(|&x| {
                let y = b0 * x + z0;
                z0 = b1 * x - a1 * y + z1;
                z1 = b2 * x - a2 * y;
                y
            })
            .collect()
    }

    /// Steady-state initial conditions for a unit step input
    pub fn lfilter_zi(&self) -> [f64; 2] {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;

        let rhs0 = b1 - a1 * b0;
        let rhs1 = b2 - a2 * b0;
        let z0 = (rhs0 + rhs1) / (1.0 + a1 + a2);
        [z0, rhs1 - a2 * z0]
    }

    /// Zero-phase forward-backward filtering.
    ///
    /// The signal is extended at both ends by odd reflection over
    /// `pad_len()` samples; the input must be longer than that.
    pub fn filtfilt(&self, input: &[f64]) -> Result<Vec<f64>, FilterError> {
        let pad = self.pad_len();
        if input.len() <= pad {
            return Err(FilterError::InsufficientSamples {
                got: input.len(),
                need: pad + 1,
            });
        }

        let extended = odd_extension(input, pad);
        let zi = self.lfilter_zi();

        let x0 = extended[0];
        let mut forward = self.lfilter(&extended, [zi[0] * x0, zi[1] * x0]);

        forward.reverse();
        let y0 = forward[0];
        let mut backward = self.lfilter(&forward, [zi[0] * y0, zi[1] * y0]);
        backward.reverse();

        Ok(backward[pad..backward.len() - pad].to_vec())
    }
}

/// Odd reflection about both end points: `2·x[0] − x[pad..1]` before and
/// `2·x[n−1] − x[n−2..n−pad−1]` after.
fn odd_extension(input: &[f64], pad: usize) -> Vec<f64> {
    let n = input.len();
    let first = input[0];
    let last = input[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - input[i]));
    extended.extend_from_slice(input);
    extended.extend((1..=pad).map(|i| 2.0 * last - input[n - 1 - i]));
    extended
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / fs).sin()).collect()
    }

    fn rms(data: &[f64]) -> f64 {
        (data.iter().map(|x| x * x).sum::<f64>() / data.len() as f64).sqrt()
    }

    #[test]
    fn test_coefficients_match_notch_design() {
        let filter = NotchFilter::new(50.0, 30.0, 256.0).unwrap();
        let (b, a) = filter.coefficients();

        // Unity gain at DC: sum(b) / sum(a) == 1
        let dc_gain = b.iter().sum::<f64>() / a.iter().sum::<f64>();
        assert!((dc_gain - 1.0).abs() < 1e-12);
        assert_eq!(b[0], b[2]);
        assert!((a[1] - b[1]).abs() < 1e-15);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            NotchFilter::new(150.0, 30.0, 256.0),
            Err(FilterError::InvalidParameters(_))
        ));
        assert!(NotchFilter::new(50.0, 0.0, 256.0).is_err());
        assert!(NotchFilter::new(50.0, 30.0, 0.0).is_err());
    }

    #[test]
    fn test_short_input_rejected() {
        let filter = NotchFilter::new(50.0, 30.0, 256.0).unwrap();
        assert_eq!(filter.pad_len(), 9);

        let result = filter.filtfilt(&[1.0; 9]);
        assert_eq!(result, Err(FilterError::InsufficientSamples { got: 9, need: 10 }));
        assert!(filter.filtfilt(&[1.0; 10]).is_ok());
    }

    #[test]
    fn test_constant_signal_passes_unchanged() {
        let filter = NotchFilter::new(50.0, 30.0, 256.0).unwrap();
        let output = filter.filtfilt(&[3.0; 64]).unwrap();

        assert_eq!(output.len(), 64);
        for y in output {
            assert!((y - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_mains_attenuated_and_alpha_preserved() {
        let filter = NotchFilter::new(50.0, 30.0, 256.0).unwrap();

        let mains = sine(50.0, 256.0, 1024);
        let filtered = filter.filtfilt(&mains).unwrap();
        // Ignore edges where the filter is still settling
        assert!(rms(&filtered[256..768]) < 0.1 * rms(&mains[256..768]));

        let alpha = sine(10.0, 256.0, 1024);
        let filtered = filter.filtfilt(&alpha).unwrap();
        assert!((rms(&filtered[256..768]) - rms(&alpha[256..768])).abs() < 0.02);
    }

    #[test]
    fn test_odd_extension() {
        let extended = odd_extension(&[1.0, 2.0, 4.0, 7.0], 2);
        assert_eq!(extended, vec![-2.0, 0.0, 1.0, 2.0, 4.0, 7.0, 10.0, 12.0]);
    }
}

// src/processing/windowing.rs
//! Taper windows and trend removal applied before spectral estimation

use std::f64::consts::PI;

/// Symmetric Hann window, `0.5 − 0.5·cos(2πn/(N−1))`
pub fn hann_window(size: usize) -> Vec<f64> {
    match size {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => (0..size)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / (size - 1) as f64).cos())
            .collect(),
    }
}

/// Periodic Hann window, `0.5 − 0.5·cos(2πn/N)`, used for averaged periodograms
pub fn hann_window_periodic(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos())
        .collect()
}

/// Subtract the least-squares line through `(i, x[i])`
pub fn detrend_linear(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    if n < 2 {
        return vec![0.0; n];
    }

    let n_f = n as f64;
    let t_mean = (n_f - 1.0) / 2.0;
    let x_mean = data.iter().sum::<f64>() / n_f;

    let (cov, var) = data.iter().enumerate().fold((0.0, 0.0), |(cov, var), (i, &x)| {
        let dt = i as f64 - t_mean;
        (cov + dt * (x - x_mean), var + dt * dt)
    });
    let slope = cov / var;

    data.iter()
        .enumerate()
        .map(|(i, &x)| x - (x_mean + slope * (i as f64 - t_mean)))
        .collect()
}

/// Subtract the mean
pub fn detrend_constant(data: &[f64]) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    data.iter().map(|x| x - mean).collect()
}

/// Multiply `data` by `window` element-wise
pub fn apply_window(data: &mut [f64], window: &[f64]) {
    for (x, w) in data.iter_mut().zip(window) {
        *x *= w;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_hann() {
        let window = hann_window(5);
        let expected = [0.0, 0.5, 1.0, 0.5, 0.0];
        for (w, e) in window.iter().zip(expected) {
            assert!((w - e).abs() < 1e-12);
        }
        assert_eq!(hann_window(1), vec![1.0]);
        assert!(hann_window(0).is_empty());
    }

    #[test]
    fn test_periodic_hann() {
        let window = hann_window_periodic(4);
        let expected = [0.0, 0.5, 1.0, 0.5];
        for (w, e) in window.iter().zip(expected) {
            assert!((w - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_linear_trend_removed() {
        let ramp: Vec<f64> = (0..32).map(|i| 3.0 + 0.5 * i as f64).collect();
        for x in detrend_linear(&ramp) {
            assert!(x.abs() < 1e-9);
        }
    }

    #[test]
    fn test_detrend_keeps_oscillation() {
        let data = [1.0, -1.0, 1.0, -1.0];
        let detrended = detrend_linear(&data);
        // Best fit line has slope -0.4 and mean 0
        let expected = [0.4, -1.2, 1.2, -0.4];
        for (x, e) in detrended.iter().zip(expected) {
            assert!((x - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constant_detrend() {
        assert_eq!(detrend_constant(&[1.0, 2.0, 3.0]), vec![-1.0, 0.0, 1.0]);
    }
}

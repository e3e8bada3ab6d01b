// src/utils/stats.rs
//! Descriptive statistics over sample slices
//!
//! Population (biased) estimators throughout. Empty input yields 0.0.

/// Arithmetic mean
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance
pub fn variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64
}

/// Population standard deviation
pub fn std_dev(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Peak-to-peak range (max - min)
pub fn peak_to_peak(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let (min, max) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    max - min
}

/// Median; the mean of the two middle values for even lengths
pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Excess (Fisher) kurtosis, biased estimator. Zero for constant input.
pub fn kurtosis(data: &[f64]) -> f64 {
    let var = variance(data);
    if var <= f64::EPSILON {
        return 0.0;
    }
    let m = mean(data);
    let m4 = data.iter().map(|x| (x - m).powi(4)).sum::<f64>() / data.len() as f64;
    m4 / (var * var) - 3.0
}

/// Largest absolute first difference
pub fn max_abs_diff(data: &[f64]) -> f64 {
    data.windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .fold(0.0, f64::max)
}

// src/processing/quality_monitor.rs
//! Multi-factor EEG signal quality scoring
//!
//! Every channel of a block is scored on six sub-metrics (0–100 each):
//! variance, peak-to-peak amplitude, relative alpha content, relative
//! line noise, artifacts (kurtosis and gradient) and stationarity. The
//! channel score is their weighted sum and the overall score is the mean
//! over channels. All scores are truncated to integers.

use std::fmt;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::constants::{quality, signal};
use crate::config::QualityConfig;
use crate::processing::spectral::welch_psd;
use crate::utils::stats;

/// Sub-scores below these produce a warning
const VARIANCE_WARNING_BELOW: u8 = 30;
const AMPLITUDE_WARNING_BELOW: u8 = 30;
const LINE_NOISE_WARNING_BELOW: u8 = 50;
const ARTIFACT_WARNING_BELOW: u8 = 40;

/// Neutral score for metrics that cannot be evaluated on short input
const SKIPPED_SCORE: u8 = 50;

/// Total-power reference band for relative spectral metrics (Hz)
const REFERENCE_BAND_HZ: (f64, f64) = (1.0, 40.0);
const ALPHA_BAND_HZ: (f64, f64) = (8.0, 13.0);
const LINE_NOISE_HALF_WIDTH_HZ: f64 = 1.0;
const STATIONARITY_PARTS: usize = 4;

/// Overall status bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityStatus {
    /// Score 80 and above
    Excellent,
    /// 60 to 79
    Good,
    /// 40 to 59
    Acceptable,
    /// Below 40
    Poor,
    /// No samples were assessed
    NotConnected,
}

impl QualityStatus {
    /// ≥80 Excellent, ≥60 Good, ≥40 Acceptable, else Poor
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => QualityStatus::Excellent,
            60..=79 => QualityStatus::Good,
            40..=59 => QualityStatus::Acceptable,
            _ => QualityStatus::Poor,
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            QualityStatus::Excellent => "Excellent",
            QualityStatus::Good => "Good",
            QualityStatus::Acceptable => "Acceptable",
            QualityStatus::Poor => "Poor",
            QualityStatus::NotConnected => "Not connected",
        }
    }
}

impl fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Measured value and its score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    /// Raw measurement
    pub value: f64,
    /// 0–100
    pub score: u8,
}

/// Artifact measurements and their combined score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArtifactScore {
    /// Excess (Fisher) kurtosis
    pub kurtosis: f64,
    /// Largest absolute sample-to-sample change
    pub max_gradient: f64,
    /// 0–100
    pub score: u8,
}

/// All sub-metrics of one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    /// Variance (µV²)
    pub variance: MetricScore,
    /// Peak-to-peak amplitude (µV)
    pub amplitude: MetricScore,
    /// Alpha power relative to 1–40 Hz
    pub alpha_power: MetricScore,
    /// Mains power relative to 1–40 Hz
    pub line_noise: MetricScore,
    /// Kurtosis and gradient
    pub artifacts: ArtifactScore,
    /// Coefficient of variation of the quarter-window variances
    pub stationarity: MetricScore,
}

impl ChannelMetrics {
    /// Weighted channel score, truncated
    pub fn aggregate(&self) -> u8 {
        let weighted = [
            (self.variance.score, quality::WEIGHT_VARIANCE),
            (self.amplitude.score, quality::WEIGHT_AMPLITUDE),
            (self.alpha_power.score, quality::WEIGHT_ALPHA),
            (self.line_noise.score, quality::WEIGHT_LINE_NOISE),
            (self.artifacts.score, quality::WEIGHT_ARTIFACTS),
            (self.stationarity.score, quality::WEIGHT_STATIONARITY),
        ];
        let total = weighted
            .iter()
            .fold(0.0, |acc, &(score, weight)| acc + f64::from(score) * weight);
        total.clamp(0.0, 100.0) as u8
    }
}

/// Result of one quality assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Mean of channel scores, 0–100
    pub overall_quality: u8,
    /// Aggregate score per channel
    pub channel_quality: Vec<u8>,
    /// Sub-metric details per channel
    pub channel_metrics: Vec<ChannelMetrics>,
    /// Human-readable problems, one per issue
    pub warnings: Vec<String>,
    /// Status derived from the overall score
    pub status: QualityStatus,
}

impl QualityReport {
    /// Report for an empty block
    pub fn not_connected() -> Self {
        Self {
            overall_quality: 0,
            channel_quality: vec![0; signal::EEG_CHANNEL_COUNT],
            channel_metrics: Vec::new(),
            warnings: vec!["No data".to_string()],
            status: QualityStatus::NotConnected,
        }
    }

    /// Status is Acceptable or better
    pub fn is_acceptable(&self) -> bool {
        matches!(
            self.status,
            QualityStatus::Excellent | QualityStatus::Good | QualityStatus::Acceptable
        )
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "EEG SIGNAL QUALITY REPORT")?;
        writeln!(f, "Overall quality: {}/100 - {}", self.overall_quality, self.status)?;
        writeln!(f, "Channel quality ({} channels):", self.channel_quality.len())?;

        for (i, &score) in self.channel_quality.iter().enumerate() {
            let filled = usize::from(score / 5);
            writeln!(
                f,
                "  {}: [{}{}] {}/100",
                channel_name(i),
                "█".repeat(filled),
                "░".repeat(20usize.saturating_sub(filled)),
                score
            )?;
        }

        if self.warnings.is_empty() {
            writeln!(f, "No warnings")
        } else {
            writeln!(f, "Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "  {}", warning)?;
            }
            Ok(())
        }
    }
}

/// Display name of channel `index`: TP9, AF7, AF8, TP10, then `CH{index}`
pub fn channel_name(index: usize) -> String {
    signal::CHANNEL_NAMES
        .get(index)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("CH{}", index))
}

/// Signal quality assessor
#[derive(Debug, Clone, Default)]
pub struct QualityAssessor {
    config: QualityConfig,
}

impl QualityAssessor {
    /// Assessor with the given thresholds
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Thresholds in use
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Score every channel of a `[samples, channels]` block
    pub fn assess_quality(&self, block: ArrayView2<'_, f64>) -> QualityReport {
        let (rows, cols) = block.dim();
        if rows == 0 || cols == 0 {
            return QualityReport::not_connected();
        }

        let mut channel_quality = Vec::with_capacity(cols);
        let mut channel_metrics = Vec::with_capacity(cols);
        let mut warnings = Vec::new();

        for (ch, column) in block.columns().into_iter().enumerate() {
            let data = column.to_vec();
            let metrics = self.channel_metrics(&data);

            warnings.extend(self.warnings_for(ch, &metrics));
            channel_quality.push(metrics.aggregate());
            channel_metrics.push(metrics);
        }

        let mean = channel_quality.iter().map(|&q| f64::from(q)).sum::<f64>() / cols as f64;
        let overall_quality = mean as u8;
        let status = QualityStatus::from_score(overall_quality);

        debug!(
            "Quality {}/100 ({}) over {} samples x {} channels, {} warnings",
            overall_quality,
            status,
            rows,
            cols,
            warnings.len()
        );

        QualityReport {
            overall_quality,
            channel_quality,
            channel_metrics,
            warnings,
            status,
        }
    }

    /// All sub-metrics for one channel
    pub fn channel_metrics(&self, data: &[f64]) -> ChannelMetrics {
        let (alpha_power, line_noise) = self.spectral_scores(data);
        ChannelMetrics {
            variance: self.check_variance(data),
            amplitude: self.check_amplitude(data),
            alpha_power,
            line_noise,
            artifacts: self.check_artifacts(data),
            stationarity: self.check_stationarity(data),
        }
    }

    fn check_variance(&self, data: &[f64]) -> MetricScore {
        let c = &self.config;
        let var = stats::variance(data);
        let (opt_low, opt_high) = c.variance_optimal;

        let score = if var < c.variance_min {
            20.0
        } else if var > c.variance_max {
            30.0
        } else if var >= opt_low && var <= opt_high {
            100.0
        } else if var < opt_low {
            50.0 + 50.0 * (var - c.variance_min) / (opt_low - c.variance_min)
        } else {
            100.0 - 70.0 * (var - opt_high) / (c.variance_max - opt_high)
        };

        MetricScore {
            value: var,
            score: score.clamp(0.0, 100.0) as u8,
        }
    }

    fn check_amplitude(&self, data: &[f64]) -> MetricScore {
        let c = &self.config;
        let ptp = stats::peak_to_peak(data);
        let (opt_low, opt_high) = c.amplitude_optimal;

        let score = if ptp > c.amplitude_max {
            20
        } else if ptp < c.amplitude_min {
            30
        } else if ptp >= opt_low && ptp <= opt_high {
            100
        } else {
            70
        };

        MetricScore { value: ptp, score }
    }

    /// Alpha content and line noise from one Welch estimate
    fn spectral_scores(&self, data: &[f64]) -> (MetricScore, MetricScore) {
        let skipped = MetricScore {
            value: 0.0,
            score: SKIPPED_SCORE,
        };
        if data.len() < quality::MIN_SPECTRAL_SAMPLES {
            return (skipped, skipped);
        }

        let c = &self.config;
        let segment = data.len().min(quality::WELCH_MAX_SEGMENT);
        let psd = welch_psd(data, c.sample_rate_hz, segment);

        let total = psd.mean_power_between(REFERENCE_BAND_HZ.0, REFERENCE_BAND_HZ.1);
        let relative = |power: f64| if total > 0.0 { power / total } else { 0.0 };

        let alpha_relative = relative(psd.mean_power_between(ALPHA_BAND_HZ.0, ALPHA_BAND_HZ.1));
        let alpha_score = if alpha_relative > 0.2 {
            100
        } else if alpha_relative > 0.1 {
            80
        } else if alpha_relative > 0.05 {
            60
        } else {
            40
        };

        let noise_relative = relative(psd.mean_power_between(
            c.mains_frequency_hz - LINE_NOISE_HALF_WIDTH_HZ,
            c.mains_frequency_hz + LINE_NOISE_HALF_WIDTH_HZ,
        ));
        let noise_score = if noise_relative > c.line_noise_max {
            30
        } else if noise_relative > c.line_noise_moderate {
            60
        } else {
            100
        };

        (
            MetricScore {
                value: alpha_relative,
                score: alpha_score,
            },
            MetricScore {
                value: noise_relative,
                score: noise_score,
            },
        )
    }

    fn check_artifacts(&self, data: &[f64]) -> ArtifactScore {
        let c = &self.config;
        let kurtosis = stats::kurtosis(data);
        let max_gradient = stats::max_abs_diff(data);

        let score = if kurtosis > c.kurtosis_severe || max_gradient > c.gradient_severe {
            20
        } else if kurtosis > c.kurtosis_moderate || max_gradient > c.gradient_moderate {
            50
        } else {
            100
        };

        ArtifactScore {
            kurtosis,
            max_gradient,
            score,
        }
    }

    fn check_stationarity(&self, data: &[f64]) -> MetricScore {
        if data.len() < quality::MIN_STATIONARITY_SAMPLES {
            return MetricScore {
                value: 0.0,
                score: SKIPPED_SCORE,
            };
        }

        let part = data.len() / STATIONARITY_PARTS;
        let variances: Vec<f64> = data
            .chunks_exact(part)
            .take(STATIONARITY_PARTS)
            .map(stats::variance)
            .collect();

        let mean = stats::mean(&variances);
        let cv = if mean > 0.0 {
            stats::std_dev(&variances) / mean
        } else {
            0.0
        };

        let score = if cv < 0.3 {
            100
        } else if cv < 0.5 {
            80
        } else if cv < 0.8 {
            60
        } else {
            40
        };

        MetricScore { value: cv, score }
    }

    fn warnings_for(&self, channel: usize, metrics: &ChannelMetrics) -> Vec<String> {
        let name = channel_name(channel);
        let mut warnings = Vec::new();

        if metrics.variance.score < VARIANCE_WARNING_BELOW {
            if metrics.variance.value < self.config.variance_min {
                warnings.push(format!("{}: Very low signal - moisten sensor!", name));
            } else {
                warnings.push(format!("{}: Very high noise - check contact", name));
            }
        }
        if metrics.amplitude.score < AMPLITUDE_WARNING_BELOW {
            warnings.push(format!("{}: Movement artifacts", name));
        }
        if metrics.line_noise.score < LINE_NOISE_WARNING_BELOW {
            warnings.push(format!(
                "{}: Electrical interference ({:.0}Hz)",
                name, self.config.mains_frequency_hz
            ));
        }
        if metrics.artifacts.score < ARTIFACT_WARNING_BELOW {
            warnings.push(format!("{}: Artifacts detected - minimize movement", name));
        }

        warnings
    }
}

/// Overall quality score (0–100) with default thresholds
pub fn quick_quality_check(block: ArrayView2<'_, f64>) -> u8 {
    QualityAssessor::default().assess_quality(block).overall_quality
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::f64::consts::PI;

    fn assessor() -> QualityAssessor {
        QualityAssessor::new(QualityConfig::default())
    }

    #[test]
    fn test_status_buckets() {
        assert_eq!(QualityStatus::from_score(100), QualityStatus::Excellent);
        assert_eq!(QualityStatus::from_score(80), QualityStatus::Excellent);
        assert_eq!(QualityStatus::from_score(79), QualityStatus::Good);
        assert_eq!(QualityStatus::from_score(40), QualityStatus::Acceptable);
        assert_eq!(QualityStatus::from_score(39), QualityStatus::Poor);
    }

    #[test]
    fn test_variance_interpolation() {
        let a = assessor();
        // Variance of +-5 square wave is 25: 50 + 50 * 15 / 40 = 68.75
        let data: Vec<f64> = (0..64).map(|i| if i % 2 == 0 { 5.0 } else { -5.0 }).collect();
        assert_eq!(a.check_variance(&data).score, 68);

        // Variance 100 is optimal
        let data: Vec<f64> = (0..64).map(|i| if i % 2 == 0 { 10.0 } else { -10.0 }).collect();
        assert_eq!(a.check_variance(&data).score, 100);
    }

    #[test]
    fn test_amplitude_bands() {
        let a = assessor();
        assert_eq!(a.check_amplitude(&[0.0, 100.0]).score, 100);
        assert_eq!(a.check_amplitude(&[0.0, 30.0]).score, 70);
        assert_eq!(a.check_amplitude(&[0.0, 600.0]).score, 20);
        assert_eq!(a.check_amplitude(&[0.0, 5.0]).score, 30);
    }

    #[test]
    fn test_spike_flagged_as_artifact() {
        let a = assessor();
        let mut data = vec![0.0; 256];
        for (i, x) in data.iter_mut().enumerate() {
            *x = (i as f64 * 0.3).sin();
        }
        data[128] = 300.0;

        let artifacts = a.check_artifacts(&data);
        assert!(artifacts.kurtosis > 10.0);
        assert_eq!(artifacts.score, 20);
    }

    #[test]
    fn test_short_input_skips_spectral_and_stationarity() {
        let a = assessor();
        let metrics = a.channel_metrics(&[1.0; 64]);
        assert_eq!(metrics.alpha_power.score, 50);
        assert_eq!(metrics.line_noise.score, 50);
        assert_eq!(metrics.stationarity.score, 50);
    }

    #[test]
    fn test_alpha_rich_signal() {
        let a = assessor();
        let data: Vec<f64> = (0..512)
            .map(|i| 40.0 * (2.0 * PI * 10.0 * i as f64 / 256.0).sin())
            .collect();
        let metrics = a.channel_metrics(&data);
        assert_eq!(metrics.alpha_power.score, 100);
        assert_eq!(metrics.line_noise.score, 100);
        assert_eq!(metrics.stationarity.score, 100);
    }

    #[test]
    fn test_mains_interference_warning() {
        let a = assessor();
        let block = Array2::from_shape_fn((512, 1), |(i, _)| {
            let t = i as f64 / 256.0;
            5.0 * (2.0 * PI * 10.0 * t).sin() + 40.0 * (2.0 * PI * 50.0 * t).sin()
        });

        let report = a.assess_quality(block.view());
        assert_eq!(report.channel_metrics[0].line_noise.score, 30);
        assert!(report.warnings.iter().any(|w| w == "TP9: Electrical interference (50Hz)"));
    }

    #[test]
    fn test_unstable_variance() {
        let a = assessor();
        let data: Vec<f64> = (0..256)
            .map(|i| {
                let gain = if i < 192 { 1.0 } else { 20.0 };
                gain * (i as f64 * 0.7).sin()
            })
            .collect();
        assert_eq!(a.check_stationarity(&data).score, 40);
    }

    #[test]
    fn test_extra_channels_named_by_index() {
        assert_eq!(channel_name(0), "TP9");
        assert_eq!(channel_name(3), "TP10");
        assert_eq!(channel_name(5), "CH5");
    }

    #[test]
    fn test_display_rendering() {
        let block = Array2::<f64>::zeros((64, 4));
        let report = assessor().assess_quality(block.view());
        let text = report.to_string();

        assert!(text.contains("Overall quality"));
        assert!(text.contains("TP10"));
        assert!(text.contains("moisten sensor"));
    }
}

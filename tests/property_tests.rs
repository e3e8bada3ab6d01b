// tests/property_tests.rs
//! Invariants over arbitrary input

use brainwave_core::acquisition::ChannelRingBuffer;
use brainwave_core::config::EegConfig;
use brainwave_core::processing::metrics::SmoothedMetric;
use brainwave_core::processing::quality_monitor::{QualityAssessor, QualityStatus};
use brainwave_core::processing::EegProcessor;
use brainwave_core::types::Band;
use ndarray::Array2;
use proptest::prelude::*;

fn block_from(values: &[f64]) -> Array2<f64> {
    let rows = values.len() / 4;
    Array2::from_shape_vec((rows, 4), values[..rows * 4].to_vec()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn band_powers_non_negative_and_consistent(values in proptest::collection::vec(-200.0f64..200.0, 256..800)) {
        let mut processor = EegProcessor::new(EegConfig::default()).unwrap();
        processor.add_data(block_from(&values).view());

        let averaged = processor.compute_band_powers();
        let per_channel = processor.compute_band_powers_per_channel();

        for band in Band::ALL {
            let channel_values = per_channel.get(band);
            prop_assert_eq!(channel_values.len(), 4);
            for &v in channel_values {
                prop_assert!(v >= 0.0 && v.is_finite(), "{} = {}", band, v);
            }
            let mean = channel_values.iter().sum::<f64>() / 4.0;
            prop_assert!((mean - averaged.get(band)).abs() <= 1e-9 * mean.abs().max(1.0));
        }
    }

    #[test]
    fn ring_buffer_keeps_tail(
        capacity in 1usize..64,
        values in proptest::collection::vec(-1e3f64..1e3, 0..200),
    ) {
        let mut buffer = ChannelRingBuffer::<f64>::new(capacity).unwrap();
        buffer.append(&values);

        let kept = values.len().min(capacity);
        prop_assert_eq!(buffer.len(), kept);
        prop_assert_eq!(buffer.to_vec(), values[values.len() - kept..].to_vec());
        prop_assert_eq!(buffer.latest(kept), Some(values[values.len() - kept..].to_vec()));
        prop_assert!(buffer.latest(capacity + 1).is_none());
    }

    #[test]
    fn smoothed_metric_stays_in_unit_range(values in proptest::collection::vec(0.0f64..=1.0, 1..40)) {
        let mut metric = SmoothedMetric::new(5);
        for &v in &values {
            let smoothed = metric.update(v);
            prop_assert!((0.0..=1.0).contains(&smoothed));
        }
        prop_assert_eq!(metric.len(), values.len().min(5));
    }

    #[test]
    fn quality_scores_bounded(values in proptest::collection::vec(-500.0f64..500.0, 4..1200)) {
        let report = QualityAssessor::default().assess_quality(block_from(&values).view());

        prop_assert!(report.overall_quality <= 100);
        prop_assert_eq!(report.channel_quality.len(), 4);
        prop_assert!(report.channel_quality.iter().all(|&q| q <= 100));
        prop_assert_eq!(report.status, QualityStatus::from_score(report.overall_quality));
    }
}

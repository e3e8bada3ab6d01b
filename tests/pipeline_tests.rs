// tests/pipeline_tests.rs
//! Compute worker behaviour: overflow, non-blocking polls, control, shutdown

use brainwave_core::config::{EegConfig, PipelineConfig, SystemConfig};
use brainwave_core::processing::pipeline::{ComputePipeline, MetricsSnapshot};
use brainwave_core::processing::CalibrationBaseline;
use brainwave_core::session::BrainSession;
use ndarray::Array2;
use serial_test::serial;
use std::f64::consts::PI;
use std::thread;
use std::time::{Duration, Instant};

fn alpha_block(rows: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, 4), |(i, ch)| {
        (20.0 + ch as f64) * (2.0 * PI * 10.0 * i as f64 / 256.0).sin()
    })
}

fn wait_until<F: FnMut() -> bool>(timeout: Duration, mut condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
#[serial]
fn test_overflow_drops_newest_submissions() {
    let mut pipeline = ComputePipeline::new(EegConfig::default(), PipelineConfig::default()).unwrap();

    let accepted = (0..10).filter(|_| pipeline.submit(alpha_block(32).view())).count();
    assert_eq!(accepted, 5);

    pipeline.start().unwrap();
    assert!(wait_until(Duration::from_secs(5), || pipeline.stats().processed == 5));

    // Nothing else should arrive
    thread::sleep(Duration::from_millis(200));
    let stats = pipeline.stats();
    assert_eq!(stats.submitted, 10);
    assert_eq!(stats.dropped, 5);
    assert_eq!(stats.processed, 5);
    assert!(pipeline.shutdown());
}

#[test]
#[serial]
fn test_burst_into_running_worker_is_accounted() {
    let mut pipeline = ComputePipeline::spawn(EegConfig::default(), PipelineConfig::default()).unwrap();
    let block = alpha_block(64);

    let mut accepted = 0u64;
    for _ in 0..200 {
        if pipeline.submit(block.view()) {
            accepted += 1;
        }
        assert!(pipeline.stats().processed <= accepted);
    }

    let stats = pipeline.stats();
    assert_eq!(stats.submitted, 200);
    assert_eq!(accepted + stats.dropped, stats.submitted);
    assert!(stats.processed <= accepted);

    // Every accepted block is eventually analysed, and nothing more
    assert!(wait_until(Duration::from_secs(5), || pipeline.stats().processed == accepted));
    thread::sleep(Duration::from_millis(200));
    let stats = pipeline.stats();
    assert_eq!(stats.processed, accepted);
    assert_eq!(stats.dropped, 200 - accepted);
    assert!(pipeline.shutdown());
}

#[test]
#[serial]
fn test_results_evict_oldest() {
    let config = PipelineConfig {
        work_queue_capacity: 20,
        ..PipelineConfig::default()
    };
    let mut pipeline = ComputePipeline::new(EegConfig::default(), config).unwrap();
    for _ in 0..8 {
        assert!(pipeline.submit(alpha_block(16).view()));
    }

    pipeline.start().unwrap();
    assert!(wait_until(Duration::from_secs(5), || pipeline.stats().processed == 8));
    assert_eq!(pipeline.stats().results_evicted, 3);

    // Eight blocks of 16 rows: the newest result saw a full window
    let newest = pipeline.poll_latest().unwrap();
    assert!(newest.band_powers.alpha > 0.0);
    assert!(pipeline.poll_latest().is_none());
    assert_eq!(pipeline.latest_metrics(), newest);
}

#[test]
#[serial]
fn test_latest_metrics_does_not_block() {
    let mut pipeline = ComputePipeline::spawn(EegConfig::default(), PipelineConfig::default()).unwrap();

    let start = Instant::now();
    for _ in 0..100 {
        assert_eq!(pipeline.latest_metrics(), MetricsSnapshot::default());
    }
    assert!(start.elapsed() < Duration::from_millis(100));
}

#[test]
#[serial]
fn test_metrics_neutral_until_calibrated() {
    let mut pipeline = ComputePipeline::spawn(EegConfig::default(), PipelineConfig::default()).unwrap();
    pipeline.submit(alpha_block(128).view());
    assert!(wait_until(Duration::from_secs(5), || pipeline.stats().processed == 1));

    let snapshot = pipeline.latest_metrics();
    assert!(!snapshot.is_calibrated);
    assert_eq!(snapshot.attention, 0.5);
    assert_eq!(snapshot.relaxation, 0.5);
    assert!(snapshot.produced_at > 0);
}

#[test]
#[serial]
fn test_worker_calibration_completes() {
    let mut pipeline = ComputePipeline::spawn(EegConfig::default(), PipelineConfig::default()).unwrap();
    pipeline.submit(alpha_block(128).view());
    assert!(pipeline.start_calibration(Duration::from_millis(600)));

    let calibrated = wait_until(Duration::from_secs(5), || {
        pipeline.submit(alpha_block(16).view());
        pipeline.latest_metrics().is_calibrated
    });
    assert!(calibrated);

    let snapshot = pipeline.latest_metrics();
    assert!(!snapshot.calibrating);
    assert!(snapshot.attention > 0.0 && snapshot.attention <= 1.0);
}

#[test]
#[serial]
fn test_reset_clears_calibration() {
    let mut pipeline = ComputePipeline::spawn(EegConfig::default(), PipelineConfig::default()).unwrap();
    pipeline.set_baseline(CalibrationBaseline::fallback());
    pipeline.submit(alpha_block(64).view());
    assert!(wait_until(Duration::from_secs(5), || pipeline.latest_metrics().is_calibrated));

    pipeline.reset();
    pipeline.submit(alpha_block(64).view());
    assert!(wait_until(Duration::from_secs(5), || {
        let snapshot = pipeline.latest_metrics();
        !snapshot.is_calibrated && snapshot.attention == 0.5
    }));
}

#[test]
#[serial]
fn test_shutdown_is_prompt_and_idempotent() {
    let mut pipeline = ComputePipeline::spawn(EegConfig::default(), PipelineConfig::default()).unwrap();
    assert!(pipeline.is_running());

    let start = Instant::now();
    assert!(pipeline.shutdown());
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(!pipeline.is_running());

    assert!(pipeline.shutdown());
    assert!(!pipeline.submit(alpha_block(16).view()));
    assert!(!pipeline.reset());
}

#[test]
#[serial]
fn test_drop_stops_worker() {
    let start = Instant::now();
    {
        let pipeline = ComputePipeline::spawn(EegConfig::default(), PipelineConfig::default()).unwrap();
        pipeline.submit(alpha_block(64).view());
    }
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
#[serial]
fn test_session_end_to_end() {
    let session = BrainSession::new(SystemConfig::default()).unwrap();
    session.set_baseline(CalibrationBaseline::fallback());

    for _ in 0..4 {
        session.push_raw_block(alpha_block(64).view());
        session.push_inertial_sample([0.0, 0.0, 1.0], [0.0; 3], 0.0);
    }

    assert!(wait_until(Duration::from_secs(5), || session.latest_metrics().is_calibrated));
    let metrics = session.latest_metrics();
    assert!(metrics.band_powers.alpha > metrics.band_powers.beta);
    assert_eq!(metrics.band_powers_per_channel.channel_count(), 4);

    let report = session.assess_recent_quality();
    assert_eq!(report.channel_quality.len(), 4);

    let gestures = session.poll_gestures();
    assert!(!gestures.any());

    assert!(session.shutdown());
}

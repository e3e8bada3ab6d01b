// tests/gesture_tests.rs
//! Gesture detection driven by a mock clock

use brainwave_core::config::MotionConfig;
use brainwave_core::motion::{MotionProcessor, TiltDirection};
use brainwave_core::utils::time::MockTimeProvider;
use std::f64::consts::PI;
use std::sync::Arc;

const RATE: f64 = 52.0;

fn setup() -> (MotionProcessor, Arc<MockTimeProvider>) {
    let clock = Arc::new(MockTimeProvider::new(1_000_000_000));
    let processor = MotionProcessor::with_time_provider(MotionConfig::default(), clock.clone()).unwrap();
    (processor, clock)
}

/// 0.8 s forward bow: acc X rises to `peak_g` mid-window and returns
fn feed_nod(processor: &mut MotionProcessor, peak_g: f64) {
    for k in 0..41 {
        let x = peak_g * (PI * k as f64 / 40.0).sin();
        processor.add_sample([x, 0.0, 1.0], [0.0; 3], k as f64 / RATE);
    }
}

fn feed_shake(processor: &mut MotionProcessor) {
    for i in 0..52 {
        let t = i as f64 / RATE;
        let z = 200.0 * (2.0 * PI * 4.0 * t).sin();
        processor.add_sample([0.0, 0.0, 1.0], [0.0, 0.0, z], t);
    }
}

#[test]
fn test_nod_detected_once_per_cooldown() {
    let (mut processor, clock) = setup();
    feed_nod(&mut processor, 1.2);

    assert!(processor.detect_nod());
    assert!(!processor.detect_nod());

    clock.advance_secs(1.0);
    assert!(!processor.detect_nod());

    clock.advance_secs(0.5);
    assert!(processor.detect_nod());
}

#[test]
fn test_small_nod_ignored() {
    let (mut processor, _) = setup();
    feed_nod(&mut processor, 0.5);
    assert!(!processor.detect_nod());
}

#[test]
fn test_nod_needs_window_of_samples() {
    let (mut processor, _) = setup();
    for k in 0..40 {
        let x = if k == 20 { 2.0 } else { 0.0 };
        processor.add_sample([x, 0.0, 1.0], [0.0; 3], k as f64 / RATE);
    }
    assert!(!processor.detect_nod());

    processor.add_sample([0.0, 0.0, 1.0], [0.0; 3], 40.0 / RATE);
    assert!(processor.detect_nod());
}

#[test]
fn test_shake_detected_with_cooldown() {
    let (mut processor, clock) = setup();
    feed_shake(&mut processor);

    assert!(processor.detect_shake());
    assert!(!processor.detect_shake());

    clock.advance_secs(1.5);
    assert!(processor.detect_shake());
}

#[test]
fn test_single_swing_is_not_a_shake() {
    let (mut processor, _) = setup();
    for i in 0..52 {
        let z = if i < 26 { 200.0 } else { -200.0 };
        processor.add_sample([0.0, 0.0, 1.0], [0.0, 0.0, z], i as f64 / RATE);
    }
    assert!(!processor.detect_shake());
}

#[test]
fn test_shake_needs_one_second() {
    let (mut processor, _) = setup();
    for i in 0..51 {
        let z = if i % 2 == 0 { 200.0 } else { -200.0 };
        processor.add_sample([0.0, 0.0, 1.0], [0.0, 0.0, z], i as f64 / RATE);
    }
    assert!(!processor.detect_shake());
}

#[test]
fn test_tilt_sequence() {
    let (mut processor, clock) = setup();

    processor.add_sample([0.0, -0.6, 0.8], [0.0; 3], 0.0);
    assert_eq!(processor.detect_tilt_change(), Some(TiltDirection::Left));

    processor.add_sample([0.0, 0.6, 0.8], [0.0; 3], 0.1);
    assert_eq!(processor.detect_tilt_change(), None);

    clock.advance_secs(0.5);
    assert_eq!(processor.detect_tilt_change(), Some(TiltDirection::Right));

    clock.advance_secs(0.5);
    processor.add_sample([0.5, 0.0, 0.8], [0.0; 3], 0.2);
    assert_eq!(processor.detect_tilt_change(), Some(TiltDirection::Backward));

    clock.advance_secs(0.5);
    processor.add_sample([0.0, 0.1, 1.0], [0.0; 3], 0.3);
    assert_eq!(processor.detect_tilt_change(), None);
}

#[test]
fn test_no_gestures_without_data() {
    let (mut processor, _) = setup();
    assert!(!processor.detect_nod());
    assert!(!processor.detect_shake());
    assert_eq!(processor.detect_tilt_change(), None);
}

#[test]
fn test_motion_metrics_snapshot() {
    let (mut processor, _) = setup();
    feed_shake(&mut processor);

    let metrics = processor.motion_metrics();
    assert!(metrics.motion_intensity > 0.4);
    assert!(!metrics.is_still);
    assert_eq!(metrics.acc, [0.0, 0.0, 1.0]);
    assert!((metrics.rotation_speed - metrics.gyro[2].abs()).abs() < 1e-12);
    assert_eq!(metrics.tilt_left_right, 0.0);
}

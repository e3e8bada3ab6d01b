// demos/basic_usage.rs
//! Basic usage example for brainwave-core with a synthetic headset stream

use brainwave_core::config::ConfigLoader;
use brainwave_core::{BrainSession, SystemConfig};
use ndarray::Array2;
use std::f64::consts::PI;
use std::thread;
use std::time::{Duration, Instant};

const EEG_RATE: f64 = 256.0;
const IMU_RATE: f64 = 52.0;
const BLOCK_ROWS: usize = 12;

/// 10 Hz rhythm that gains 20 Hz activity after `focus_after` seconds
fn eeg_block(start_row: usize, focus_after: f64) -> Array2<f64> {
    Array2::from_shape_fn((BLOCK_ROWS, 4), |(i, ch)| {
        let t = (start_row + i) as f64 / EEG_RATE;
        let alpha = 25.0 * (2.0 * PI * 10.0 * t + ch as f64).sin();
        let beta = if t > focus_after { 15.0 * (2.0 * PI * 20.0 * t).sin() } else { 0.0 };
        alpha + beta
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("brainwave-core basic usage");
    println!("==========================");

    let config = match std::env::args().nth(1) {
        Some(path) => ConfigLoader::with_file(path).load()?,
        None => SystemConfig::default(),
    };
    let summary = config.get_summary();
    println!("EEG: {} Hz, window {} samples", summary.eeg_sample_rate_hz, summary.window_size);

    let session = BrainSession::new(config)?;
    session.start_calibration(Duration::from_secs(2));

    let started = Instant::now();
    let mut row = 0;
    let mut imu_clock = 0.0;

    while started.elapsed() < Duration::from_secs(6) {
        session.push_raw_block(eeg_block(row, 3.0).view());
        row += BLOCK_ROWS;

        // Inertial samples arrive about once per 19 ms
        let t = row as f64 / EEG_RATE;
        while imu_clock < t {
            let nod = if (4.0..4.8).contains(&imu_clock) {
                1.2 * (PI * (imu_clock - 4.0) / 0.8).sin()
            } else {
                0.0
            };
            session.push_inertial_sample([nod, 0.0, 1.0], [0.0; 3], imu_clock);
            imu_clock += 1.0 / IMU_RATE;
        }

        let gestures = session.poll_gestures();
        if gestures.any() {
            println!("gesture: {:?}", gestures);
        }

        if row % (BLOCK_ROWS * 32) == 0 {
            let metrics = session.latest_metrics();
            println!(
                "t={:.1}s attention={:.2} relaxation={:.2} calibrated={} alpha={:.1}",
                t, metrics.attention, metrics.relaxation, metrics.is_calibrated, metrics.band_powers.alpha
            );
        }

        thread::sleep(Duration::from_secs_f64(BLOCK_ROWS as f64 / EEG_RATE));
    }

    println!("\n{}", session.assess_recent_quality());
    println!("pipeline: {:?}", session.pipeline_stats());

    session.shutdown();
    Ok(())
}

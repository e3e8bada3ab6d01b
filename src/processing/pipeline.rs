// src/processing/pipeline.rs
//! Background compute pipeline
//!
//! Raw blocks go through a bounded work queue (drop-newest on overflow) to a
//! dedicated worker thread that owns the `EegProcessor`. Each processed block
//! yields a `MetricsSnapshot` on a bounded result queue (evict-oldest on
//! overflow). Producers and consumers never block on each other.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, select, Receiver, RecvTimeoutError, Sender, TryRecvError};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::constants::{metrics, pipeline, signal};
use crate::config::{validate_pipeline_config, EegConfig, PipelineConfig};
use crate::error::{BrainwaveError, BrainwaveResult};
use crate::processing::calibration::{CalibrationBaseline, CalibrationSession};
use crate::processing::processor::{Analysis, EegProcessor};
use crate::processing::queue::{BoundedQueue, OverflowPolicy, PushOutcome, QueueConsumer, QueueProducer};
use crate::types::{BandPowers, ChannelBandPowers};
use crate::utils::time::{SystemTimeProvider, TimeProvider};

/// Commands for the worker. Carried on their own unbounded channel so they
/// are never subject to the work-queue overflow policy.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    /// Start a non-blocking calibration of the given length
    Calibrate(Duration),
    /// Install a baseline and cancel any running calibration
    SetBaseline(CalibrationBaseline),
    /// Clear buffers, calibration and metric history
    Reset,
    /// Stop the worker loop
    Shutdown,
}

/// Consumer-facing result of one analysis cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Smoothed attention in [0, 1]
    pub attention: f64,
    /// Smoothed relaxation in [0, 1]
    pub relaxation: f64,
    /// Channel-averaged band powers (µV²)
    pub band_powers: BandPowers,
    /// Band powers of each channel (µV²)
    pub band_powers_per_channel: ChannelBandPowers,
    /// A baseline is installed
    pub is_calibrated: bool,
    /// A calibration session is collecting samples
    pub calibrating: bool,
    /// Nanoseconds from the pipeline clock
    pub produced_at: u64,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            attention: metrics::NEUTRAL_METRIC,
            relaxation: metrics::NEUTRAL_METRIC,
            band_powers: BandPowers::default(),
            band_powers_per_channel: ChannelBandPowers::zeros(signal::EEG_CHANNEL_COUNT),
            is_calibrated: false,
            calibrating: false,
            produced_at: 0,
        }
    }
}

impl MetricsSnapshot {
    fn from_analysis(analysis: Analysis, calibrating: bool, produced_at: u64) -> Self {
        Self {
            attention: analysis.attention,
            relaxation: analysis.relaxation,
            band_powers: analysis.band_powers,
            band_powers_per_channel: analysis.band_powers_per_channel,
            is_calibrated: analysis.is_calibrated,
            calibrating,
            produced_at,
        }
    }
}

/// Pipeline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Non-empty blocks offered to the work queue
    pub submitted: u64,
    /// Blocks rejected because the work queue was full
    pub dropped: u64,
    /// Blocks analysed by the worker
    pub processed: u64,
    /// Unread results discarded to make room for newer ones
    pub results_evicted: u64,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    dropped: AtomicU64,
    processed: AtomicU64,
    results_evicted: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Acquire),
            results_evicted: self.results_evicted.load(Ordering::Relaxed),
        }
    }
}

/// Everything the worker thread takes ownership of
struct WorkerState {
    processor: EegProcessor,
    work: QueueConsumer<Array2<f64>>,
    results: QueueProducer<MetricsSnapshot>,
    control: Receiver<ControlMessage>,
    stop: Arc<AtomicBool>,
    counters: Arc<Counters>,
    clock: Arc<dyn TimeProvider>,
    poll_timeout: Duration,
    calibration_interval: Duration,
    done: Sender<()>,
}

/// Producer/consumer harness around a background `EegProcessor`
pub struct ComputePipeline {
    config: PipelineConfig,
    work: QueueProducer<Array2<f64>>,
    results: QueueConsumer<MetricsSnapshot>,
    control: Sender<ControlMessage>,
    stop: Arc<AtomicBool>,
    counters: Arc<Counters>,
    pending: Option<WorkerState>,
    worker: Option<JoinHandle<()>>,
    /// Signalled by the worker right before it exits
    done: Receiver<()>,
    last_snapshot: MetricsSnapshot,
}

impl ComputePipeline {
    /// Build a pipeline without starting its worker.
    ///
    /// Blocks submitted before `start` wait in the work queue.
    pub fn new(eeg: EegConfig, config: PipelineConfig) -> BrainwaveResult<Self> {
        Self::with_time_provider(eeg, config, Arc::new(SystemTimeProvider))
    }

    /// Build a pipeline that timestamps results with `clock`
    pub fn with_time_provider(
        eeg: EegConfig,
        config: PipelineConfig,
        clock: Arc<dyn TimeProvider>,
    ) -> BrainwaveResult<Self> {
        let mut errors = Vec::new();
        validate_pipeline_config(&config, &mut errors);
        if !errors.is_empty() {
            return Err(BrainwaveError::configuration("pipeline", errors.join("; ")));
        }

        let processor = EegProcessor::new(eeg)?;
        let (work_tx, work_rx) = BoundedQueue::new(config.work_queue_capacity, OverflowPolicy::DropNewest);
        let (result_tx, result_rx) =
            BoundedQueue::new(config.result_queue_capacity, OverflowPolicy::EvictOldest);
        let (control_tx, control_rx) = channel::unbounded();
        let (done_tx, done_rx) = channel::bounded(1);

        let stop = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(Counters::default());

        let pending = WorkerState {
            processor,
            work: work_rx,
            results: result_tx,
            control: control_rx,
            stop: Arc::clone(&stop),
            counters: Arc::clone(&counters),
            clock,
            poll_timeout: Duration::from_millis(config.worker_poll_timeout_ms),
            calibration_interval: Duration::from_millis(config.calibration_sample_interval_ms),
            done: done_tx,
        };

        Ok(Self {
            config,
            work: work_tx,
            results: result_rx,
            control: control_tx,
            stop,
            counters,
            pending: Some(pending),
            worker: None,
            done: done_rx,
            last_snapshot: MetricsSnapshot::default(),
        })
    }

    /// Build and start a pipeline
    pub fn spawn(eeg: EegConfig, config: PipelineConfig) -> BrainwaveResult<Self> {
        let mut pipeline = Self::new(eeg, config)?;
        pipeline.start()?;
        Ok(pipeline)
    }

    /// Start the worker thread. Starting twice is a no-op.
    pub fn start(&mut self) -> BrainwaveResult<()> {
        let Some(state) = self.pending.take() else {
            return Ok(());
        };

        let handle = thread::Builder::new()
            .name(pipeline::WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(state))
            .map_err(|e| BrainwaveError::pipeline("spawn", e.to_string()))?;

        debug!("Compute worker '{}' started", pipeline::WORKER_THREAD_NAME);
        self.worker = Some(handle);
        Ok(())
    }

    /// Worker thread started and not shut down
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Offer a `[samples, channels]` block to the worker without blocking.
    ///
    /// Returns false when the block was empty or dropped because the work
    /// queue is full.
    pub fn submit(&self, block: ArrayView2<'_, f64>) -> bool {
        let (rows, cols) = block.dim();
        if rows == 0 || cols == 0 {
            return false;
        }

        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        match self.work.push(block.to_owned()) {
            PushOutcome::Accepted | PushOutcome::Evicted => true,
            PushOutcome::Dropped => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                trace!("Work queue full, block of {} samples dropped", rows);
                false
            }
            PushOutcome::Disconnected => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                trace!("Compute worker gone, block dropped");
                false
            }
        }
    }

    /// Newest result if one arrived since the last poll
    pub fn poll_latest(&mut self) -> Option<MetricsSnapshot> {
        let (latest, _) = self.results.drain_latest();
        if let Some(snapshot) = &latest {
            self.last_snapshot = snapshot.clone();
        }
        latest
    }

    /// Newest result, or the last known one when nothing new is ready
    pub fn latest_metrics(&mut self) -> MetricsSnapshot {
        self.poll_latest();
        self.last_snapshot.clone()
    }

    /// Start a non-blocking calibration in the worker
    pub fn start_calibration(&self, duration: Duration) -> bool {
        self.send_control(ControlMessage::Calibrate(duration))
    }

    /// Install `baseline` in the worker
    pub fn set_baseline(&self, baseline: CalibrationBaseline) -> bool {
        self.send_control(ControlMessage::SetBaseline(baseline))
    }

    /// Reset the worker's processor state
    pub fn reset(&self) -> bool {
        self.send_control(ControlMessage::Reset)
    }

    fn send_control(&self, message: ControlMessage) -> bool {
        match self.control.send(message) {
            Ok(()) => true,
            Err(e) => {
                trace!("Control message {:?} not delivered, worker gone", e.into_inner());
                false
            }
        }
    }

    /// Current counter values
    pub fn stats(&self) -> PipelineStats {
        self.counters.snapshot()
    }

    /// Configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stop the worker, waiting up to the join timeout.
    ///
    /// Returns false when the worker did not exit in time and was detached.
    pub fn shutdown(&mut self) -> bool {
        self.stop.store(true, Ordering::Release);
        let _ = self.control.send(ControlMessage::Shutdown);
        self.pending = None;

        let Some(handle) = self.worker.take() else {
            return true;
        };

        let timeout = Duration::from_millis(self.config.join_timeout_ms);
        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    warn!("Compute worker panicked");
                }
                debug!("Compute worker stopped");
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Compute worker did not stop within {} ms, detaching",
                    self.config.join_timeout_ms
                );
                false
            }
        }
    }
}

impl Drop for ComputePipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// What woke the worker
enum WorkerEvent {
    Control(ControlMessage),
    Block(Array2<f64>),
    Idle,
    Disconnected,
}

fn run_worker(mut state: WorkerState) {
    let mut calibration: Option<CalibrationSession> = None;

    while !state.stop.load(Ordering::Acquire) {
        if !drain_control(&mut state, &mut calibration) {
            break;
        }

        let event = select! {
            recv(state.control) -> message => message.map_or(WorkerEvent::Disconnected, WorkerEvent::Control),
            recv(state.work.receiver()) -> block => block.map_or(WorkerEvent::Disconnected, WorkerEvent::Block),
            default(state.poll_timeout) => WorkerEvent::Idle,
        };

        match event {
            WorkerEvent::Control(message) => {
                if !apply_control(&mut state.processor, &mut calibration, state.calibration_interval, message) {
                    break;
                }
            }
            WorkerEvent::Block(block) => {
                // Control sent before this block is applied first
                if !drain_control(&mut state, &mut calibration) {
                    break;
                }
                process_block(&mut state, block.view(), calibration.is_some());
            }
            WorkerEvent::Idle => {}
            WorkerEvent::Disconnected => break,
        }

        calibration = advance_calibration(&mut state.processor, calibration);
    }

    debug!("Compute worker exiting");
    let _ = state.done.send(());
}

/// Apply every queued control message. False once the worker should stop.
fn drain_control(state: &mut WorkerState, calibration: &mut Option<CalibrationSession>) -> bool {
    loop {
        match state.control.try_recv() {
            Ok(message) => {
                if !apply_control(&mut state.processor, calibration, state.calibration_interval, message) {
                    return false;
                }
            }
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

fn apply_control(
    processor: &mut EegProcessor,
    calibration: &mut Option<CalibrationSession>,
    sample_interval: Duration,
    message: ControlMessage,
) -> bool {
    match message {
        ControlMessage::Shutdown => return false,
        ControlMessage::Calibrate(duration) => {
            *calibration = Some(CalibrationSession::new(Instant::now(), duration, sample_interval));
        }
        ControlMessage::SetBaseline(baseline) => {
            *calibration = None;
            processor.set_baseline(baseline);
        }
        ControlMessage::Reset => {
            *calibration = None;
            processor.reset();
        }
    }
    true
}

fn process_block(state: &mut WorkerState, block: ArrayView2<'_, f64>, calibrating: bool) {
    state.processor.add_data(block);
    let analysis = state.processor.analyze();

    let snapshot = MetricsSnapshot::from_analysis(analysis, calibrating, state.clock.now_nanos());
    match state.results.push(snapshot) {
        PushOutcome::Evicted => {
            state.counters.results_evicted.fetch_add(1, Ordering::Relaxed);
        }
        PushOutcome::Accepted => {}
        PushOutcome::Dropped | PushOutcome::Disconnected => trace!("Result discarded"),
    }
    // Counted once the result is visible to consumers
    state.counters.processed.fetch_add(1, Ordering::Release);
}

/// Sample the current band powers when due; install the baseline once the
/// session deadline passes
fn advance_calibration(
    processor: &mut EegProcessor,
    calibration: Option<CalibrationSession>,
) -> Option<CalibrationSession> {
    let mut session = calibration?;
    let now = Instant::now();

    if session.sample_due(now) {
        let powers = processor.compute_band_powers();
        session.record(&powers, now);
    }

    if session.is_expired(now) {
        processor.set_baseline(session.finish());
        None
    } else {
        Some(session)
    }
}

// src/processing/mod.rs
//! EEG processing: filtering, spectra, metrics, quality and the compute worker

pub mod calibration;
pub mod filters;
pub mod metrics;
pub mod pipeline;
pub mod processor;
pub mod quality_monitor;
pub mod queue;
pub mod spectral;
pub mod windowing;

pub use calibration::{CalibrationBaseline, CalibrationSession};
pub use filters::{FilterError, NotchFilter};
pub use metrics::{MetricEngine, MetricValues, SmoothedMetric};
pub use pipeline::{ComputePipeline, ControlMessage, MetricsSnapshot, PipelineStats};
pub use processor::{Analysis, EegProcessor};
pub use quality_monitor::*;
pub use queue::{BoundedQueue, OverflowPolicy, PushOutcome, QueueConsumer, QueueProducer};
pub use spectral::{BoundedSpectrumCache, NoSpectrumCache, SpectralEngine, Spectrum, SpectrumCache};

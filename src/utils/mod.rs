// src/utils/mod.rs
//! Shared utilities: clocks and descriptive statistics

pub mod stats;
pub mod time;

pub use time::{
    current_timestamp_nanos,
    MockTimeProvider,
    MonotonicTimeProvider,
    SystemTimeProvider,
    TimeProvider,
};

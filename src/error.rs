// src/error.rs
//! Unified error handling for brainwave-core
//!
//! The processing path itself never returns errors: insufficient data, filter
//! failures and queue overflow all degrade to documented defaults. Errors only
//! surface at construction seams (configuration, config loading, worker spawn).

use thiserror::Error;

use crate::config::ConfigError;
use crate::processing::filters::FilterError;

/// Unified error type for the crate
#[derive(Debug, Error)]
pub enum BrainwaveError {
    /// Configuration and setup errors
    #[error("[CONFIG] Configuration error in {component}: {reason}")]
    Configuration {
        /// Component that rejected the configuration
        component: String,
        /// Human readable reason
        reason: String,
    },

    /// Invalid input data errors
    #[error("[DATA] Invalid {data_type}: {reason}")]
    InvalidData {
        /// What kind of data was rejected
        data_type: String,
        /// Human readable reason
        reason: String,
    },

    /// Filter design errors
    #[error("[FILTER] {0}")]
    Filter(#[from] FilterError),

    /// Worker lifecycle errors
    #[error("[PIPELINE] {operation} failed: {reason}")]
    Pipeline {
        /// Operation that failed (spawn, shutdown, ...)
        operation: String,
        /// Human readable reason
        reason: String,
    },

    /// Configuration loading errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for brainwave operations
pub type BrainwaveResult<T> = Result<T, BrainwaveError>;

impl BrainwaveError {
    /// Build a configuration error
    pub fn configuration(component: &str, reason: impl Into<String>) -> Self {
        BrainwaveError::Configuration {
            component: component.to_string(),
            reason: reason.into(),
        }
    }

    /// Build an invalid-data error
    pub fn invalid_data(data_type: &str, reason: impl Into<String>) -> Self {
        BrainwaveError::InvalidData {
            data_type: data_type.to_string(),
            reason: reason.into(),
        }
    }

    /// Build a pipeline error
    pub fn pipeline(operation: &str, reason: impl Into<String>) -> Self {
        BrainwaveError::Pipeline {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

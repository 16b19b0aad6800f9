//! Signal processing module - metric engine and health scoring
//!
//! Pure, synchronous computations over an in-memory reading series:
//! - `preprocess`: drop non-finite readings, enforce minimum length, pick the baseline
//! - `regression`: ordinary least squares shared by slope, noise and DFA
//! - `metrics`: bias, slope, noise/SNR, hysteresis
//! - `dfa`: detrended fluctuation analysis (Hurst exponent)
//! - `health_scoring`: threshold penalties, flags and status
//! - `diagnosis`: diagnosis, recommendation and RUL text

mod preprocess;
mod regression;
mod metrics;
mod dfa;
mod health_scoring;
mod diagnosis;

pub use preprocess::*;
pub use regression::LinearFit;
pub use metrics::*;
pub use dfa::{detrended_fluctuation, DfaOutcome, DfaStatus};
pub use health_scoring::{assess_health, status_from, HealthAssessment, MetricScore, Severity};
pub use diagnosis::{diagnose, predict_rul, recommend};

use thiserror::Error;

/// Input that cannot be analyzed. Never retried; the caller must supply
/// more or cleaner data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Insufficient data: need {needed} points, have {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("Timestamp count {timestamps} does not match value count {values}")]
    TimestampMismatch { values: usize, timestamps: usize },

    #[error("Invalid analysis config: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error("Invalid series length: {0} (must be > 0)")]
    InvalidLength(usize),

    #[error("Malformed input: {0}")]
    Malformed(String),
}

//! Preprocessing and validation of raw reading series

use chrono::{DateTime, NaiveDateTime, Utc};
use statrs::statistics::Statistics;

use super::ValidationError;
use crate::config::defaults::REFERENCE_WINDOW_FRACTION;
use crate::config::AnalysisConfig;

/// Reference level that bias is measured against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Baseline {
    /// Mean of the first ~10% of the series
    ReferenceWindow { mean: f64, len: usize },
    /// Caller-supplied nominal value
    Setpoint(f64),
}

impl Baseline {
    pub fn value(&self) -> f64 {
        match self {
            Baseline::ReferenceWindow { mean, .. } => *mean,
            Baseline::Setpoint(v) => *v,
        }
    }
}

/// A series that passed validation: finite values only, at least
/// `min_data_points` long.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSeries {
    pub values: Vec<f64>,
    /// Timestamps of the surviving values, when the caller supplied them
    pub timestamps: Option<Vec<String>>,
    pub baseline: Baseline,
    /// Number of readings dropped as missing or non-finite
    pub dropped: usize,
}

impl ValidatedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Length of the reference window for a series of `n` samples:
/// `max(1, round(0.1 * n))`.
pub fn reference_window_len(n: usize) -> usize {
    ((n as f64 * REFERENCE_WINDOW_FRACTION).round() as usize).max(1)
}

/// Clean and validate a raw series.
///
/// Missing and non-finite readings are dropped together with their
/// timestamps. The remaining count must reach `config.min_data_points`.
pub fn preprocess(
    values: &[Option<f64>],
    timestamps: Option<&[String]>,
    setpoint: Option<f64>,
    config: &AnalysisConfig,
) -> Result<ValidatedSeries, ValidationError> {
    if let Some(ts) = timestamps {
        if ts.len() != values.len() {
            return Err(ValidationError::TimestampMismatch {
                values: values.len(),
                timestamps: ts.len(),
            });
        }
    }
    if let Some(sp) = setpoint {
        if !sp.is_finite() {
            return Err(ValidationError::InvalidConfig(vec![format!(
                "setpoint must be finite (got {sp})"
            )]));
        }
    }

    let keep: Vec<usize> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| x.is_finite()).map(|_| i))
        .collect();
    let clean: Vec<f64> = keep.iter().filter_map(|&i| values[i]).collect();
    let dropped = values.len() - clean.len();

    if clean.len() < config.min_data_points {
        return Err(ValidationError::InsufficientData {
            needed: config.min_data_points,
            available: clean.len(),
        });
    }

    let baseline = match setpoint {
        Some(sp) => Baseline::Setpoint(sp),
        None => {
            let len = reference_window_len(clean.len());
            Baseline::ReferenceWindow {
                mean: clean[..len].iter().mean(),
                len,
            }
        }
    };

    if dropped > 0 {
        tracing::debug!(dropped, kept = clean.len(), "Dropped missing/non-finite readings");
    }

    Ok(ValidatedSeries {
        values: clean,
        timestamps: timestamps.map(|ts| keep.iter().map(|&i| ts[i].clone()).collect()),
        baseline,
        dropped,
    })
}

/// Validate a plain slice of readings (live monitor buffers, generated series).
pub fn preprocess_values(
    values: &[f64],
    config: &AnalysisConfig,
) -> Result<ValidatedSeries, ValidationError> {
    let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    preprocess(&wrapped, None, None, config)
}

/// Parse an RFC 3339 timestamp, or a naive ISO 8601 one taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Mean sampling period inferred from the first and last timestamps.
///
/// `None` when timestamps are absent, unparsable or not increasing.
pub fn sample_period(timestamps: &[String]) -> Option<chrono::Duration> {
    if timestamps.len() < 2 {
        return None;
    }
    let first = parse_timestamp(timestamps.first()?)?;
    let last = parse_timestamp(timestamps.last()?)?;
    let span = last - first;
    let steps = i32::try_from(timestamps.len() - 1).ok()?;
    let period = span / steps;
    (period > chrono::Duration::zero()).then_some(period)
}

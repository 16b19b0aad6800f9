//! Sensor data sources: CSV readings and the synthetic scenario generator

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::processing::ValidationError;
use crate::types::{AnalysisRequest, SensorType};

// ============================================================================
// CSV readings
// ============================================================================

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("Failed to read CSV ({path}): {1}", path = .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Read a reading series from a CSV file into an analysis request.
///
/// Expected CSV format, one reading per line, either
/// `value` or `timestamp,value`. A leading `timestamp`/`value` header is
/// skipped. Empty value cells are missing readings.
pub fn read_csv_request(
    path: &Path,
    sensor_id: &str,
    sensor_type: SensorType,
) -> Result<AnalysisRequest, CsvError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| CsvError::Io(path.to_path_buf(), e))?;
    let (values, timestamps) = parse_csv_readings(&contents)?;

    tracing::info!(
        count = values.len(),
        path = %path.display(),
        timestamped = timestamps.is_some(),
        "Loaded readings from CSV"
    );

    Ok(AnalysisRequest {
        sensor_id: sensor_id.to_string(),
        sensor_type,
        values,
        timestamps,
        config: None,
        setpoint: None,
    })
}

/// Parse CSV text into readings and, for two-column input, timestamps.
pub fn parse_csv_readings(
    contents: &str,
) -> Result<(Vec<Option<f64>>, Option<Vec<String>>), ValidationError> {
    let mut values = Vec::new();
    let mut timestamps = Vec::new();
    let mut columns: Option<usize> = None;

    for (idx, line) in contents.lines().enumerate() {
        let line_num = idx + 1;
        let line = line.trim();

        // Skip empty lines
        if line.is_empty() {
            continue;
        }
        // Skip header line
        if columns.is_none() && (line.starts_with("timestamp") || line.starts_with("value")) {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        match columns {
            None => columns = Some(fields.len()),
            Some(expected) if expected != fields.len() => {
                return Err(ValidationError::Malformed(format!(
                    "Expected {expected} fields, got {} on line {line_num}",
                    fields.len()
                )));
            }
            Some(_) => {}
        }

        let (timestamp, raw) = match fields.as_slice() {
            [value] => (None, *value),
            [ts, value] => (Some(*ts), *value),
            _ => {
                return Err(ValidationError::Malformed(format!(
                    "Expected 1 or 2 fields, got {} on line {line_num}",
                    fields.len()
                )))
            }
        };
        values.push(parse_reading(raw, line_num)?);
        if let Some(ts) = timestamp {
            timestamps.push(ts.to_string());
        }
    }

    let timestamps = (columns == Some(2)).then_some(timestamps);
    Ok((values, timestamps))
}

/// Parse a reading cell; an empty cell is a missing reading.
fn parse_reading(s: &str, line_num: usize) -> Result<Option<f64>, ValidationError> {
    if s.is_empty() {
        return Ok(None);
    }
    s.parse::<f64>()
        .map(Some)
        .map_err(|_| ValidationError::Malformed(format!("Cannot parse reading '{s}' on line {line_num}")))
}

// ============================================================================
// Synthetic scenarios
// ============================================================================

/// Nominal level every scenario oscillates around.
const SCENARIO_BASELINE: f64 = 10.0;
/// Gaussian samples are bounded at this many standard deviations.
const NOISE_BOUND_SIGMAS: f64 = 3.0;
const DRIFT_PER_SAMPLE: f64 = 0.075;
const OSCILLATION_AMPLITUDE: f64 = 5.0;
const OSCILLATION_PERIOD: f64 = 12.5;

/// Simulated sensor behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    /// Baseline with small bounded noise
    #[default]
    #[serde(alias = "normal")]
    Normal,
    /// Normal plus a steady upward ramp
    #[serde(alias = "drifting")]
    Drifting,
    /// Baseline with heavy noise
    #[serde(alias = "noisy")]
    Noisy,
    /// Baseline plus a periodic swing
    #[serde(alias = "oscillation")]
    Oscillation,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Normal,
        Scenario::Drifting,
        Scenario::Noisy,
        Scenario::Oscillation,
    ];

    fn noise_sigma(self) -> f64 {
        match self {
            Scenario::Normal | Scenario::Drifting => 0.5,
            Scenario::Noisy => 3.0,
            Scenario::Oscillation => 0.2,
        }
    }

    /// Deterministic part of the signal at sample `index`.
    fn signal(self, index: usize) -> f64 {
        let t = index as f64;
        match self {
            Scenario::Normal | Scenario::Noisy => SCENARIO_BASELINE,
            Scenario::Drifting => SCENARIO_BASELINE + DRIFT_PER_SAMPLE * t,
            Scenario::Oscillation => {
                SCENARIO_BASELINE
                    + OSCILLATION_AMPLITUDE * (std::f64::consts::TAU * t / OSCILLATION_PERIOD).sin()
            }
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scenario::Normal => write!(f, "Normal"),
            Scenario::Drifting => write!(f, "Drifting"),
            Scenario::Noisy => write!(f, "Noisy"),
            Scenario::Oscillation => write!(f, "Oscillation"),
        }
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown scenario '{s}' (expected Normal, Drifting, Noisy or Oscillation)")
            })
    }
}

/// Seeded generator for synthetic sensor series.
///
/// Usable in batch (`generate`) or streaming (`next_value`) form; both draw
/// from the same sample index, so a stream continues where a batch ended.
#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    scenario: Scenario,
    rng: StdRng,
    index: usize,
}

impl SyntheticGenerator {
    /// Create a generator. `None` seeds from OS entropy.
    pub fn new(scenario: Scenario, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            scenario,
            rng,
            index: 0,
        }
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    /// Number of samples produced so far.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Produce the next sample of the stream.
    pub fn next_value(&mut self) -> f64 {
        let sigma = self.scenario.noise_sigma();
        let z: f64 = self.rng.sample(StandardNormal);
        let noise = (z * sigma).clamp(-NOISE_BOUND_SIGMAS * sigma, NOISE_BOUND_SIGMAS * sigma);
        let value = self.scenario.signal(self.index) + noise;
        self.index += 1;
        value
    }

    /// Produce the next `length` samples.
    pub fn generate(&mut self, length: usize) -> Result<Vec<f64>, ValidationError> {
        if length == 0 {
            return Err(ValidationError::InvalidLength(length));
        }
        let values: Vec<f64> = (0..length).map(|_| self.next_value()).collect();
        tracing::debug!(scenario = %self.scenario, length, "Generated synthetic series");
        Ok(values)
    }

    /// Produce `length` samples as a timestamped analysis request, one sample
    /// every `period` starting at `start`.
    pub fn generate_request(
        &mut self,
        sensor_id: &str,
        sensor_type: SensorType,
        length: usize,
        start: DateTime<Utc>,
        period: chrono::Duration,
    ) -> Result<AnalysisRequest, ValidationError> {
        let values = self.generate(length)?;
        let timestamps = (0..length)
            .map(|i| {
                let offset = i32::try_from(i)
                    .map(|i| period * i)
                    .map_err(|_| ValidationError::InvalidLength(length))?;
                Ok((start + offset).to_rfc3339())
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;
        Ok(AnalysisRequest::new(sensor_id, sensor_type, &values).with_timestamps(timestamps))
    }
}

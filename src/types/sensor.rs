//! Sensor identity and analysis input

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::processing::ValidationError;

/// Physical quantity measured by a sensor.
///
/// Unrecognised names deserialize to `Generic`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
pub enum SensorType {
    #[serde(alias = "flow", alias = "FLOW")]
    Flow,
    #[serde(alias = "pressure", alias = "PRESSURE")]
    Pressure,
    #[serde(alias = "temperature", alias = "TEMPERATURE")]
    Temperature,
    #[default]
    #[serde(other)]
    Generic,
}

impl SensorType {
    /// Engineering unit used in diagnosis text and reports.
    pub fn unit(&self) -> &'static str {
        match self {
            SensorType::Flow => "m³/h",
            SensorType::Pressure => "bar",
            SensorType::Temperature => "°C",
            SensorType::Generic => "",
        }
    }
}

impl std::fmt::Display for SensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorType::Flow => write!(f, "Flow"),
            SensorType::Pressure => write!(f, "Pressure"),
            SensorType::Temperature => write!(f, "Temperature"),
            SensorType::Generic => write!(f, "Generic"),
        }
    }
}

impl std::str::FromStr for SensorType {
    type Err = std::convert::Infallible;

    /// Case-insensitive; unrecognised names map to `Generic`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "flow" => SensorType::Flow,
            "pressure" => SensorType::Pressure,
            "temperature" => SensorType::Temperature,
            _ => SensorType::Generic,
        })
    }
}

/// One-shot analysis input.
///
/// `values` keeps insertion order. `None` entries (JSON `null`) are missing
/// readings and are dropped during preprocessing, like NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisRequest {
    pub sensor_id: String,
    #[serde(default)]
    pub sensor_type: SensorType,
    pub values: Vec<Option<f64>>,
    /// Parallel to `values` when present (RFC 3339 strings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<Vec<String>>,
    /// Overrides the analyzer's thresholds for this call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<AnalysisConfig>,
    /// Explicit bias baseline; the reference window is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setpoint: Option<f64>,
}

impl AnalysisRequest {
    pub fn new(sensor_id: impl Into<String>, sensor_type: SensorType, values: &[f64]) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            sensor_type,
            values: values.iter().copied().map(Some).collect(),
            timestamps: None,
            config: None,
            setpoint: None,
        }
    }

    #[must_use]
    pub fn with_timestamps(mut self, timestamps: Vec<String>) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn with_setpoint(mut self, setpoint: f64) -> Self {
        self.setpoint = Some(setpoint);
        self
    }

    /// Parse a JSON request. Non-numeric readings and unknown fields are
    /// validation failures.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json).map_err(|e| ValidationError::Malformed(e.to_string()))
    }
}

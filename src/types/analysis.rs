//! Metric, flag, and result types produced by the analysis pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::str::FromStr;

// ============================================================================
// Metrics
// ============================================================================

/// Diagnostic statistics computed over one analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    /// Mean of the window minus the baseline
    pub bias: f64,
    /// OLS slope per sample
    pub slope: f64,
    /// Population standard deviation of the OLS residuals
    pub noise_std: f64,
    /// Signal-to-noise ratio (dB), clamped to ±100
    pub snr_db: f64,
    /// Normalised rising/falling discrepancy
    pub hysteresis: f64,
    /// DFA scaling exponent in [0, 1]
    pub hurst: f64,
    /// R² of the DFA log-log regression
    pub hurst_r2: f64,
}

/// Scored metrics, declared in diagnosis priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    Slope,
    Bias,
    Noise,
    Hysteresis,
    Dfa,
}

impl Metric {
    /// All scored metrics, highest diagnosis priority first.
    pub const PRIORITY: [Metric; 5] = [
        Metric::Slope,
        Metric::Bias,
        Metric::Noise,
        Metric::Hysteresis,
        Metric::Dfa,
    ];

    /// Flag prefix, e.g. `SLOPE` in `SLOPE_WARNING`.
    pub fn code(self) -> &'static str {
        match self {
            Metric::Slope => "SLOPE",
            Metric::Bias => "BIAS",
            Metric::Noise => "NOISE",
            Metric::Hysteresis => "HYSTERESIS",
            Metric::Dfa => "DFA",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Slope => "Drift (slope)",
            Metric::Bias => "Bias",
            Metric::Noise => "Noise",
            Metric::Hysteresis => "Hysteresis",
            Metric::Dfa => "Long-range correlation (DFA)",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        Self::PRIORITY.into_iter().find(|m| m.code() == code)
    }
}

// ============================================================================
// Flags
// ============================================================================

/// Threshold violation or analysis condition.
///
/// Serialized as its string code (`SLOPE_CRITICAL`, `INSUFFICIENT_DATA`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flag {
    Critical(Metric),
    Warning(Metric),
    /// Series too short for DFA; Hurst fell back to 0.5
    InsufficientData,
    /// DFA log-log fit below the R² floor; DFA not scored
    DfaUnreliable,
}

impl Flag {
    pub fn is_critical(&self) -> bool {
        matches!(self, Flag::Critical(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Flag::Warning(_))
    }

    pub fn metric(&self) -> Option<Metric> {
        match self {
            Flag::Critical(m) | Flag::Warning(m) => Some(*m),
            Flag::InsufficientData | Flag::DfaUnreliable => None,
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flag::Critical(m) => write!(f, "{}_CRITICAL", m.code()),
            Flag::Warning(m) => write!(f, "{}_WARNING", m.code()),
            Flag::InsufficientData => write!(f, "INSUFFICIENT_DATA"),
            Flag::DfaUnreliable => write!(f, "DFA_UNRELIABLE"),
        }
    }
}

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSUFFICIENT_DATA" => return Ok(Flag::InsufficientData),
            "DFA_UNRELIABLE" => return Ok(Flag::DfaUnreliable),
            _ => {}
        }
        if let Some(metric) = s.strip_suffix("_CRITICAL").and_then(Metric::from_code) {
            return Ok(Flag::Critical(metric));
        }
        if let Some(metric) = s.strip_suffix("_WARNING").and_then(Metric::from_code) {
            return Ok(Flag::Warning(metric));
        }
        Err(format!("unknown flag code '{s}'"))
    }
}

impl Serialize for Flag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Status & Result
// ============================================================================

/// Three-band health status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HealthStatus {
    Green,
    Yellow,
    Red,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Green => write!(f, "Green"),
            HealthStatus::Yellow => write!(f, "Yellow"),
            HealthStatus::Red => write!(f, "Red"),
        }
    }
}

/// Output of one analysis call. Never mutated after it is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sensor_id: String,
    pub timestamp: DateTime<Utc>,
    /// 0 (failed) to 100 (perfect)
    pub health_score: f64,
    pub status: HealthStatus,
    pub diagnosis: String,
    pub metrics: MetricSet,
    pub flags: BTreeSet<Flag>,
    pub recommendation: String,
    /// Remaining-useful-life estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
}

impl AnalysisResult {
    /// Check for a flag by its string code.
    pub fn has_flag(&self, code: &str) -> bool {
        self.flags.iter().any(|f| f.to_string() == code)
    }
}

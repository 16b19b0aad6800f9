//! Sensor analysis configuration - all thresholds as operator-tunable TOML values
//!
//! Every threshold of the scoring policy is a field in this module. Each struct
//! implements `Default` with the documented values, so an analysis without a
//! config file behaves exactly like one with an empty file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use super::validation::{validate_unknown_keys, ValidationWarning};
use crate::sensors::Scenario;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a QorSense deployment.
///
/// Load with `QorsenseConfig::load()` which searches:
/// 1. `$QORSENSE_CONFIG` env var
/// 2. `./qorsense.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QorsenseConfig {
    /// Analysis thresholds
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Live monitor tuning
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl QorsenseConfig {
    /// Load configuration using the standard search order:
    /// 1. `$QORSENSE_CONFIG` environment variable
    /// 2. `./qorsense.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// A file that exists but fails to parse or validate is an error, never a
    /// silent fallback.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("QORSENSE_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                let config = Self::load_from_file(&p)?;
                info!(path = %p.display(), "Loaded config from QORSENSE_CONFIG");
                return Ok(config);
            }
            warn!(path = %path, "QORSENSE_CONFIG points to non-existent file, falling back");
        }

        let local = PathBuf::from("qorsense.toml");
        if local.exists() {
            let config = Self::load_from_file(&local)?;
            info!("Loaded config from ./qorsense.toml");
            return Ok(config);
        }

        info!("No qorsense.toml found — using built-in defaults");
        Ok(Self::default())
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are rejected up front so the error can carry "did you mean"
    /// suggestions instead of serde's bare message.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let unknown = validate_unknown_keys(contents);
        if !unknown.is_empty() {
            return Err(ConfigError::UnknownKeys(unknown));
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate every section for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = self.analysis.validate().err().unwrap_or_default();

        if self.monitor.buffer_capacity == 0 {
            errors.push("monitor.buffer_capacity must be > 0".to_string());
        }
        if self.monitor.interval_ms == 0 {
            errors.push("monitor.interval_ms must be > 0".to_string());
        }
        if self.monitor.buffer_capacity < self.analysis.min_data_points {
            errors.push(format!(
                "monitor.buffer_capacity ({}) is smaller than analysis.min_data_points ({}) — the live monitor could never analyze",
                self.monitor.buffer_capacity, self.analysis.min_data_points
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Analysis Thresholds
// ============================================================================

/// Thresholds for one analysis call.
///
/// The optional warnings resolve through [`noise_warning`](Self::noise_warning),
/// [`hysteresis_warning`](Self::hysteresis_warning) and
/// [`dfa_warning`](Self::dfa_warning).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Slope (per sample) warning threshold
    pub slope_warning: f64,
    /// Slope (per sample) critical threshold
    pub slope_critical: f64,
    /// Absolute bias warning threshold
    pub bias_warning: f64,
    /// Absolute bias critical threshold
    pub bias_critical: f64,
    /// Residual noise warning threshold (default: half of critical)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_warning: Option<f64>,
    /// Residual noise critical threshold
    pub noise_critical: f64,
    /// Normalised hysteresis warning threshold (default: half of critical)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hysteresis_warning: Option<f64>,
    /// Normalised hysteresis critical threshold
    pub hysteresis_critical: f64,
    /// |hurst - 0.5| warning threshold (default: two-thirds of critical)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dfa_warning: Option<f64>,
    /// |hurst - 0.5| critical threshold
    pub dfa_critical: f64,
    /// Minimum clean samples required for an analysis
    pub min_data_points: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            slope_warning: defaults::SLOPE_WARNING,
            slope_critical: defaults::SLOPE_CRITICAL,
            bias_warning: defaults::BIAS_WARNING,
            bias_critical: defaults::BIAS_CRITICAL,
            noise_warning: None,
            noise_critical: defaults::NOISE_CRITICAL,
            hysteresis_warning: None,
            hysteresis_critical: defaults::HYSTERESIS_CRITICAL,
            dfa_warning: None,
            dfa_critical: defaults::DFA_CRITICAL,
            min_data_points: defaults::MIN_DATA_POINTS,
        }
    }
}

impl AnalysisConfig {
    pub fn noise_warning(&self) -> f64 {
        self.noise_warning
            .unwrap_or(self.noise_critical * defaults::DEFAULT_WARNING_FRACTION)
    }

    pub fn hysteresis_warning(&self) -> f64 {
        self.hysteresis_warning
            .unwrap_or(self.hysteresis_critical * defaults::DEFAULT_WARNING_FRACTION)
    }

    pub fn dfa_warning(&self) -> f64 {
        self.dfa_warning
            .unwrap_or(self.dfa_critical * defaults::DEFAULT_DFA_WARNING_FRACTION)
    }

    /// Validate all thresholds for internal consistency.
    ///
    /// Rules:
    /// - Every threshold must be finite and > 0
    /// - Critical thresholds must be >= warning thresholds
    /// - `min_data_points` must be at least 2 (a slope needs two points)
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors: Vec<String> = Vec::new();

        Self::check_escalation(self.slope_warning, self.slope_critical, "slope", &mut errors);
        Self::check_escalation(self.bias_warning, self.bias_critical, "bias", &mut errors);
        Self::check_escalation(self.noise_warning(), self.noise_critical, "noise", &mut errors);
        Self::check_escalation(
            self.hysteresis_warning(),
            self.hysteresis_critical,
            "hysteresis",
            &mut errors,
        );
        Self::check_escalation(self.dfa_warning(), self.dfa_critical, "dfa", &mut errors);

        if self.min_data_points < 2 {
            errors.push(format!(
                "min_data_points = {} must be >= 2",
                self.min_data_points
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_escalation(warning: f64, critical: f64, name: &str, errors: &mut Vec<String>) {
        // NaN/Inf comparisons silently pass; catch them explicitly
        if !warning.is_finite() || !critical.is_finite() {
            errors.push(format!(
                "{name}: values must be finite (got warning={warning}, critical={critical})"
            ));
            return;
        }
        if warning <= 0.0 {
            errors.push(format!("{name}: warning ({warning:.3}) must be > 0"));
        }
        if critical < warning {
            errors.push(format!(
                "{name}: critical ({critical:.3}) must be >= warning ({warning:.3})"
            ));
        }
    }
}

// ============================================================================
// Live Monitor
// ============================================================================

/// Live monitor tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Tick interval in milliseconds
    pub interval_ms: u64,
    /// Rolling buffer capacity per sensor
    pub buffer_capacity: usize,
    /// Scenario simulated when no external feed is attached
    pub scenario: Scenario,
    /// Seed for the scenario generator; random when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: defaults::MONITOR_INTERVAL_MS,
            buffer_capacity: defaults::MONITOR_BUFFER_CAPACITY,
            scenario: Scenario::Normal,
            seed: None,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({path}): {1}", path = .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({path}): {1}", path = .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown config keys: {}", format_warnings(.0))]
    UnknownKeys(Vec<ValidationWarning>),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

fn format_warnings(warnings: &[ValidationWarning]) -> String {
    warnings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Tests
// ============================================================================

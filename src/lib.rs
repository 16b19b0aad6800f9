//! QorSense: Industrial Sensor Health Analysis
//!
//! Turns an ordered series of sensor readings into a health score, a
//! Green/Yellow/Red status, threshold flags, a diagnosis and a
//! remaining-useful-life estimate.
//!
//! ## Architecture
//!
//! - **Preprocessing**: drops missing readings, enforces minimum length, picks the bias baseline
//! - **Metric Engine**: bias, slope, noise/SNR, hysteresis and DFA (Hurst exponent)
//! - **Scoring**: weighted threshold penalties, flags and status bands
//! - **Live Monitor**: rolling buffer re-analyzed on every tick of an async loop
//! - **Synthetic Sensors**: seeded Normal/Drifting/Noisy/Oscillation scenarios

pub mod analyzer;
pub mod config;
pub mod monitor;
pub mod processing;
pub mod report;
pub mod sensors;
pub mod types;

// Re-export the analysis entry points
pub use analyzer::{DetailedAnalysis, SensorAnalyzer};
pub use config::{AnalysisConfig, ConfigError, MonitorConfig, QorsenseConfig};
pub use processing::ValidationError;

// Re-export commonly used types
pub use types::{AnalysisRequest, AnalysisResult, Flag, HealthStatus, MetricSet, SensorType};

// Re-export live monitoring
pub use monitor::{LiveMonitor, MonitorCommand, MonitorLoop, MonitorState};

// Re-export synthetic data and reporting
pub use report::ReportSummary;
pub use sensors::{Scenario, SyntheticGenerator};

//! Shared data structures for sensor health analysis
//!
//! This module defines the core types of the analysis pipeline:
//! - Input: `AnalysisRequest` (raw readings + optional thresholds), `SensorType`
//! - Metric engine output: `MetricSet`
//! - Scoring output: `Metric`, `Flag`, `HealthStatus`
//! - Final output: `AnalysisResult`

mod analysis;
mod sensor;

pub use analysis::*;
pub use sensor::*;

//! Analysis Configuration Module
//!
//! Provides analysis thresholds and live monitor tuning loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `QORSENSE_CONFIG` environment variable (path to TOML file)
//! 2. `qorsense.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! Configuration is passed explicitly: the analyzer and each live monitor own
//! the `AnalysisConfig` they were built with.
//!
//! ```ignore
//! let config = QorsenseConfig::load()?;
//! let analyzer = SensorAnalyzer::new(config.analysis.clone())?;
//! ```

mod sensor_config;
pub mod defaults;
pub mod validation;

pub use sensor_config::*;

//! System-wide default constants.
//!
//! Centralises the fixed numbers of the scoring policy and the metric engine.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Analysis thresholds (defaults for `AnalysisConfig`)
// ============================================================================

/// Slope (units per sample) at which drift becomes a warning.
pub const SLOPE_WARNING: f64 = 0.05;

/// Slope (units per sample) at which drift becomes critical.
pub const SLOPE_CRITICAL: f64 = 0.1;

/// Absolute offset from the baseline that raises a bias warning.
pub const BIAS_WARNING: f64 = 1.0;

/// Absolute offset from the baseline that is critical.
pub const BIAS_CRITICAL: f64 = 2.0;

/// Residual standard deviation that is critical.
pub const NOISE_CRITICAL: f64 = 1.5;

/// Normalised hysteresis that is critical.
pub const HYSTERESIS_CRITICAL: f64 = 0.5;

/// Deviation of the Hurst exponent from 0.5 that is critical.
///
/// 0.3 corresponds to a Hurst exponent above 0.8 or below 0.2.
pub const DFA_CRITICAL: f64 = 0.3;

/// Minimum number of clean samples required to run an analysis.
pub const MIN_DATA_POINTS: usize = 50;

/// Fraction of the critical value used when no explicit noise or hysteresis warning is set.
pub const DEFAULT_WARNING_FRACTION: f64 = 0.5;

/// Fraction of `dfa_critical` used when no explicit DFA warning is set.
pub const DEFAULT_DFA_WARNING_FRACTION: f64 = 2.0 / 3.0;

// ============================================================================
// Scoring policy
// ============================================================================

/// Health scores below this are Red regardless of flags.
pub const RED_SCORE_CUTOFF: f64 = 50.0;

/// Health scores below this are at least Yellow.
pub const YELLOW_SCORE_CUTOFF: f64 = 80.0;

/// Maximum penalty for drift (slope).
pub const SLOPE_WEIGHT: f64 = 30.0;

/// Maximum penalty for bias.
pub const BIAS_WEIGHT: f64 = 25.0;

/// Maximum penalty for noise.
pub const NOISE_WEIGHT: f64 = 20.0;

/// Maximum penalty for hysteresis.
pub const HYSTERESIS_WEIGHT: f64 = 10.0;

/// Maximum penalty for long-range correlation (DFA).
pub const DFA_WEIGHT: f64 = 15.0;

/// Below this R² the DFA fit is considered unreliable and is not scored.
pub const DFA_MIN_R_SQUARED: f64 = 0.9;

/// Slopes smaller than this are treated as no trend for RUL extrapolation.
pub const NEGLIGIBLE_SLOPE: f64 = 1e-6;

// ============================================================================
// Metric engine
// ============================================================================

/// SNR reported when the residual noise is zero (dB). Also the clamp bound.
pub const SNR_CAP_DB: f64 = 100.0;

/// Fraction of the series used as the bias reference window.
pub const REFERENCE_WINDOW_FRACTION: f64 = 0.1;

/// Smallest DFA window length.
pub const DFA_MIN_SCALE: usize = 4;

/// Number of log-spaced DFA scales requested before deduplication.
pub const DFA_SCALE_COUNT: usize = 20;

/// Fluctuations at or below this are discarded from the DFA regression.
pub const DFA_MIN_FLUCTUATION: f64 = 1e-12;

/// Hurst exponent reported when the series is too short for DFA.
pub const DFA_FALLBACK_HURST: f64 = 0.5;

// ============================================================================
// Live monitor
// ============================================================================

/// Rolling buffer capacity per sensor (samples).
pub const MONITOR_BUFFER_CAPACITY: usize = 100;

/// Interval between live monitor ticks (milliseconds).
pub const MONITOR_INTERVAL_MS: u64 = 1_000;

// ============================================================================
// Reports
// ============================================================================

/// Maximum number of points in a report trend snapshot.
pub const REPORT_TREND_POINTS: usize = 100;

//! Health Scoring Module
//!
//! Deterministic, threshold-based health score for a single sensor window.
//! Every metric is turned into a deviation from nominal and scored against its
//! warning/critical pair; the score is 100 minus the summed penalties.
//!
//! The same inputs always give the same score, flags and status.

use std::collections::BTreeSet;

use super::dfa::{DfaOutcome, DfaStatus};
use crate::config::defaults::{
    BIAS_WEIGHT, DFA_MIN_R_SQUARED, DFA_WEIGHT, HYSTERESIS_WEIGHT, NOISE_WEIGHT, RED_SCORE_CUTOFF,
    SLOPE_WEIGHT, YELLOW_SCORE_CUTOFF,
};
use crate::config::AnalysisConfig;
use crate::types::{Flag, HealthStatus, Metric, MetricSet};

/// Band a single metric falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Nominal,
    Warning,
    Critical,
}

/// Scoring detail for one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricScore {
    pub metric: Metric,
    /// Distance from nominal (|slope|, |bias|, noise_std, hysteresis, |hurst - 0.5|)
    pub deviation: f64,
    pub warning: f64,
    pub critical: f64,
    /// Maximum penalty
    pub weight: f64,
    pub penalty: f64,
    pub severity: Severity,
    /// False when the metric was excluded from scoring (unreliable DFA)
    pub scored: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthAssessment {
    /// 0-100 (100 = perfect health)
    pub health_score: f64,
    pub status: HealthStatus,
    pub flags: BTreeSet<Flag>,
    /// One entry per metric, in diagnosis priority order
    pub scores: Vec<MetricScore>,
}

/// Calculate health score, flags and status for one metric set.
///
/// # Scoring Algorithm
///
/// Each metric contributes a penalty of at most its weight:
/// - 30 Drift (|slope|)
/// - 25 Bias (|bias|)
/// - 20 Noise (residual std)
/// - 15 Long-range correlation (|hurst - 0.5|)
/// - 10 Hysteresis
///
/// The DFA term is only scored when the estimate succeeded with an R² of at
/// least 0.9. A short series adds `INSUFFICIENT_DATA`; a poor fit adds
/// `DFA_UNRELIABLE`.
pub fn assess_health(
    metrics: &MetricSet,
    dfa: &DfaOutcome,
    config: &AnalysisConfig,
) -> HealthAssessment {
    let dfa_scored = dfa.is_reliable(DFA_MIN_R_SQUARED);

    let scores = vec![
        score_metric(
            Metric::Slope,
            metrics.slope.abs(),
            config.slope_warning,
            config.slope_critical,
            SLOPE_WEIGHT,
        ),
        score_metric(
            Metric::Bias,
            metrics.bias.abs(),
            config.bias_warning,
            config.bias_critical,
            BIAS_WEIGHT,
        ),
        score_metric(
            Metric::Noise,
            metrics.noise_std,
            config.noise_warning(),
            config.noise_critical,
            NOISE_WEIGHT,
        ),
        score_metric(
            Metric::Hysteresis,
            metrics.hysteresis,
            config.hysteresis_warning(),
            config.hysteresis_critical,
            HYSTERESIS_WEIGHT,
        ),
        {
            let score = score_metric(
                Metric::Dfa,
                (metrics.hurst - 0.5).abs(),
                config.dfa_warning(),
                config.dfa_critical,
                DFA_WEIGHT,
            );
            if dfa_scored {
                score
            } else {
                MetricScore {
                    penalty: 0.0,
                    severity: Severity::Nominal,
                    scored: false,
                    ..score
                }
            }
        },
    ];

    let mut flags = BTreeSet::new();
    for score in &scores {
        match score.severity {
            Severity::Critical => {
                flags.insert(Flag::Critical(score.metric));
            }
            Severity::Warning => {
                flags.insert(Flag::Warning(score.metric));
            }
            Severity::Nominal => {}
        }
    }
    match dfa.status {
        DfaStatus::TooShort => {
            flags.insert(Flag::InsufficientData);
        }
        DfaStatus::Estimated if !dfa_scored => {
            flags.insert(Flag::DfaUnreliable);
        }
        _ => {}
    }

    let total_penalty: f64 = scores.iter().map(|s| s.penalty).sum();
    let health_score = (100.0 - total_penalty).clamp(0.0, 100.0);
    let status = status_from(health_score, &flags);

    tracing::debug!(
        health_score,
        status = %status,
        flags = flags.len(),
        "Health assessed"
    );

    HealthAssessment {
        health_score,
        status,
        flags,
        scores,
    }
}

/// Three-band status from score and flags.
///
/// - Red: any `_CRITICAL` flag, or score < 50
/// - Yellow: any `_WARNING` flag, or score < 80
/// - Green: otherwise
pub fn status_from(health_score: f64, flags: &BTreeSet<Flag>) -> HealthStatus {
    if flags.iter().any(Flag::is_critical) || health_score < RED_SCORE_CUTOFF {
        HealthStatus::Red
    } else if flags.iter().any(Flag::is_warning) || health_score < YELLOW_SCORE_CUTOFF {
        HealthStatus::Yellow
    } else {
        HealthStatus::Green
    }
}

fn score_metric(metric: Metric, deviation: f64, warning: f64, critical: f64, weight: f64) -> MetricScore {
    let severity = if deviation >= critical {
        Severity::Critical
    } else if deviation >= warning {
        Severity::Warning
    } else {
        Severity::Nominal
    };
    MetricScore {
        metric,
        deviation,
        warning,
        critical,
        weight,
        penalty: penalty(deviation, warning, critical, weight),
        severity,
        scored: true,
    }
}

/// Piecewise penalty for one deviation.
///
/// Bands:
/// - below warning → 0
/// - warning to critical → linear ramp 0 to `weight`
/// - at or above critical → `weight`
fn penalty(deviation: f64, warning: f64, critical: f64, weight: f64) -> f64 {
    if deviation >= critical {
        weight
    } else if deviation < warning {
        0.0
    } else {
        // critical > warning here, so the ramp is well defined
        weight * (deviation - warning) / (critical - warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assess(metrics: &MetricSet, status: DfaStatus, config: &AnalysisConfig) -> HealthAssessment {
        let dfa = DfaOutcome {
            hurst: metrics.hurst,
            alpha: metrics.hurst,
            r_squared: metrics.hurst_r2,
            scales: Vec::new(),
            fluctuations: Vec::new(),
            status,
        };
        assess_health(metrics, &dfa, config)
    }

    fn nominal_metrics() -> MetricSet {
        MetricSet {
            bias: 0.0,
            slope: 0.0,
            noise_std: 0.1,
            snr_db: 40.0,
            hysteresis: 0.01,
            hurst: 0.5,
            hurst_r2: 0.99,
        }
    }

    #[test]
    fn test_penalty_bands() {
        assert_eq!(penalty(0.0, 1.0, 2.0, 25.0), 0.0);
        assert_eq!(penalty(0.999, 1.0, 2.0, 25.0), 0.0);
        assert_eq!(penalty(1.0, 1.0, 2.0, 25.0), 0.0);
        assert!((penalty(1.5, 1.0, 2.0, 25.0) - 12.5).abs() < 1e-12);
        assert_eq!(penalty(2.0, 1.0, 2.0, 25.0), 25.0);
        assert_eq!(penalty(50.0, 1.0, 2.0, 25.0), 25.0);
        // Equal thresholds jump straight to the plateau
        assert_eq!(penalty(1.0, 1.0, 1.0, 10.0), 10.0);
    }

    #[test]
    fn test_perfect_metrics_score_100_green() {
        let assessment = assess(&nominal_metrics(), DfaStatus::Estimated, &AnalysisConfig::default());
        assert_eq!(assessment.health_score, 100.0);
        assert_eq!(assessment.status, HealthStatus::Green);
        assert!(assessment.flags.is_empty());
        assert_eq!(assessment.scores.len(), 5);
    }

    #[test]
    fn test_score_monotonic_in_each_metric() {
        let config = AnalysisConfig::default();
        let setters: [fn(&mut MetricSet, f64); 5] = [
            |m, x| m.slope = x * 0.15,
            |m, x| m.bias = -x * 3.0,
            |m, x| m.noise_std = x * 2.0,
            |m, x| m.hysteresis = x * 0.8,
            |m, x| m.hurst = 0.5 + x * 0.45,
        ];
        for (i, set) in setters.iter().enumerate() {
            let mut previous = f64::INFINITY;
            for step in 0..=40 {
                let mut metrics = nominal_metrics();
                set(&mut metrics, f64::from(step) / 40.0);
                let score = assess(&metrics, DfaStatus::Estimated, &config).health_score;
                assert!(score <= previous, "metric {i} step {step}: {score} > {previous}");
                previous = score;
            }
            assert!(previous < 100.0, "metric {i} never penalised");
        }
    }

    #[test]
    fn test_any_critical_forces_red() {
        let config = AnalysisConfig::default();
        let cases: [fn(&mut MetricSet); 5] = [
            |m| m.slope = 0.1,
            |m| m.bias = 2.0,
            |m| m.noise_std = 1.5,
            |m| m.hysteresis = 0.5,
            |m| m.hurst = 0.85,
        ];
        for (i, apply) in cases.iter().enumerate() {
            let mut metrics = nominal_metrics();
            apply(&mut metrics);
            let assessment = assess(&metrics, DfaStatus::Estimated, &config);
            assert!(assessment.health_score >= 70.0, "case {i}: one metric costs at most 30");
            assert_eq!(assessment.status, HealthStatus::Red, "case {i}");
            assert!(assessment.flags.iter().any(Flag::is_critical), "case {i}");
        }
    }

    #[test]
    fn test_warning_band_sets_yellow() {
        let mut metrics = nominal_metrics();
        metrics.slope = 0.06;
        let assessment = assess(&metrics, DfaStatus::Estimated, &AnalysisConfig::default());
        assert!(assessment.flags.contains(&Flag::Warning(Metric::Slope)));
        assert_eq!(assessment.status, HealthStatus::Yellow);
        assert!((assessment.health_score - 94.0).abs() < 1e-9, "Score: {}", assessment.health_score);
    }

    #[test]
    fn test_unreliable_dfa_is_not_scored() {
        let mut metrics = nominal_metrics();
        metrics.hurst = 0.95;
        metrics.hurst_r2 = 0.5;
        let assessment = assess(&metrics, DfaStatus::Estimated, &AnalysisConfig::default());
        assert_eq!(assessment.health_score, 100.0);
        assert!(assessment.flags.contains(&Flag::DfaUnreliable));
        assert!(!assessment.flags.contains(&Flag::Critical(Metric::Dfa)));
        assert_eq!(assessment.status, HealthStatus::Green);
    }

    #[test]
    fn test_dfa_scored_only_for_reliable_outcome() {
        let mut metrics = nominal_metrics();
        metrics.hurst = 0.95;
        let config = AnalysisConfig::default();

        let estimated = assess(&metrics, DfaStatus::Estimated, &config);
        assert!(estimated.flags.contains(&Flag::Critical(Metric::Dfa)));
        assert_eq!(estimated.health_score, 85.0);

        // A good fit from a fallback outcome must not be scored
        for status in [DfaStatus::TooShort, DfaStatus::Degenerate] {
            let fallback = assess(&metrics, status, &config);
            assert_eq!(fallback.health_score, 100.0, "{status:?}");
            assert!(!fallback.flags.contains(&Flag::Critical(Metric::Dfa)), "{status:?}");
            assert!(!fallback.scores[4].scored, "{status:?}");
        }
    }

    #[test]
    fn test_short_series_flags_insufficient_data() {
        let mut metrics = nominal_metrics();
        metrics.hurst_r2 = 0.0;
        let assessment = assess(&metrics, DfaStatus::TooShort, &AnalysisConfig::default());
        assert!(assessment.flags.contains(&Flag::InsufficientData));
        assert_eq!(assessment.status, HealthStatus::Green);

        let degenerate = assess(&metrics, DfaStatus::Degenerate, &AnalysisConfig::default());
        assert!(degenerate.flags.is_empty());
    }

    #[test]
    fn test_status_from_score_cutoffs() {
        let none = BTreeSet::new();
        assert_eq!(status_from(100.0, &none), HealthStatus::Green);
        assert_eq!(status_from(80.0, &none), HealthStatus::Green);
        assert_eq!(status_from(79.9, &none), HealthStatus::Yellow);
        assert_eq!(status_from(50.0, &none), HealthStatus::Yellow);
        assert_eq!(status_from(49.9, &none), HealthStatus::Red);

        let mut info_only = BTreeSet::new();
        info_only.insert(Flag::DfaUnreliable);
        assert_eq!(status_from(95.0, &info_only), HealthStatus::Green);
    }
}

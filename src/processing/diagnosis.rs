//! Diagnosis, recommendation and remaining-useful-life text
//!
//! Templated strings derived from a `HealthAssessment`. Nothing here affects
//! the score or status.

use std::collections::BTreeSet;

use super::health_scoring::{MetricScore, Severity};
use super::regression::LinearFit;
use crate::config::defaults::NEGLIGIBLE_SLOPE;
use crate::config::AnalysisConfig;
use crate::types::{Flag, HealthStatus, Metric, MetricSet};

const NOMINAL_DIAGNOSIS: &str = "All diagnostic metrics within nominal limits";

/// One sentence naming the worst-offending metric.
///
/// The worst metric is the one with the largest penalty; `scores` must be in
/// priority order so the first of equal penalties wins.
pub fn diagnose(scores: &[MetricScore], metrics: &MetricSet, unit: &str) -> String {
    let worst = scores
        .iter()
        .filter(|s| s.penalty > 0.0)
        .fold(None::<&MetricScore>, |best, s| match best {
            Some(b) if b.penalty >= s.penalty => Some(b),
            _ => Some(s),
        });

    let Some(worst) = worst else {
        return NOMINAL_DIAGNOSIS.to_string();
    };

    let (band, threshold) = match worst.severity {
        Severity::Critical => ("critical", worst.critical),
        _ => ("warning", worst.warning),
    };
    format!(
        "{} is the dominant issue: {} (deviation {:.4} beyond {} threshold {:.4})",
        worst.metric.label(),
        describe_value(worst.metric, metrics, unit),
        worst.deviation,
        band,
        threshold
    )
}

fn describe_value(metric: Metric, metrics: &MetricSet, unit: &str) -> String {
    let with_unit = |value: String| {
        if unit.is_empty() {
            value
        } else {
            format!("{value} {unit}")
        }
    };
    match metric {
        Metric::Slope => {
            let per = if unit.is_empty() { "units" } else { unit };
            format!("slope {:+.4} {per}/sample", metrics.slope)
        }
        Metric::Bias => format!("offset {}", with_unit(format!("{:+.4}", metrics.bias))),
        Metric::Noise => format!(
            "residual std {} (SNR {:.1} dB)",
            with_unit(format!("{:.4}", metrics.noise_std)),
            metrics.snr_db
        ),
        Metric::Hysteresis => format!("normalised hysteresis {:.4}", metrics.hysteresis),
        Metric::Dfa => format!("Hurst exponent {:.3}", metrics.hurst),
    }
}

/// Status lead sentence plus one action per flagged metric.
pub fn recommend(status: HealthStatus, flags: &BTreeSet<Flag>) -> String {
    let mut parts = vec![match status {
        HealthStatus::Green => "Sensor operating normally; continue routine monitoring.",
        HealthStatus::Yellow => "Sensor performance degrading; schedule a maintenance check.",
        HealthStatus::Red => "Sensor health critical; immediate attention required.",
    }
    .to_string()];

    let flagged: BTreeSet<Metric> = flags.iter().filter_map(Flag::metric).collect();
    for metric in Metric::PRIORITY {
        if flagged.contains(&metric) {
            parts.push(action_for(metric).to_string());
        }
    }
    if flags.contains(&Flag::InsufficientData) {
        parts.push("Collect a longer window to assess long-range correlation.".to_string());
    }
    if flags.contains(&Flag::DfaUnreliable) {
        parts.push("DFA fit is weak; long-range correlation was not scored.".to_string());
    }

    parts.join(" ")
}

fn action_for(metric: Metric) -> &'static str {
    match metric {
        Metric::Slope => "Recalibrate span and zero to correct drift.",
        Metric::Bias => "Perform a zero-offset calibration against a reference.",
        Metric::Noise => "Inspect wiring, grounding and cable shielding.",
        Metric::Hysteresis => "Check for mechanical wear or sticking in the sensing element.",
        Metric::Dfa => "Investigate persistent drift or process memory effects.",
    }
}

/// Remaining-useful-life estimate from linear extrapolation of the drift.
///
/// The fitted value at the last sample is projected toward
/// `baseline ± bias_critical` in the direction of the slope. With a known
/// sample period the sample count is also rendered as wall-clock time.
pub fn predict_rul(
    fit: &LinearFit,
    baseline: f64,
    config: &AnalysisConfig,
    sample_period: Option<chrono::Duration>,
) -> String {
    if !fit.slope.is_finite() || fit.slope.abs() < NEGLIGIBLE_SLOPE {
        return "Insufficient trend".to_string();
    }

    let current = fit.end_value();
    let distance = if fit.slope > 0.0 {
        baseline + config.bias_critical - current
    } else {
        current - (baseline - config.bias_critical)
    };
    if distance <= 0.0 {
        return "Critical threshold exceeded".to_string();
    }

    let samples = (distance / fit.slope.abs()).round();
    let mut prediction = format!("~{samples:.0} samples");
    if let Some(period) = sample_period {
        let period_secs = period.num_milliseconds() as f64 / 1000.0;
        if period_secs > 0.0 {
            prediction.push_str(&format!(" ({})", format_duration(samples * period_secs)));
        }
    }
    prediction
}

fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("~{seconds:.0} s")
    } else if seconds < 3_600.0 {
        format!("~{:.0} min", seconds / 60.0)
    } else if seconds < 86_400.0 {
        format!("~{:.1} hours", seconds / 3_600.0)
    } else {
        format!("~{:.1} days", seconds / 86_400.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{assess_health, DfaOutcome, DfaStatus, HealthAssessment};

    fn assess(m: &MetricSet, config: &AnalysisConfig) -> HealthAssessment {
        let dfa = DfaOutcome {
            hurst: m.hurst,
            alpha: m.hurst,
            r_squared: m.hurst_r2,
            scales: Vec::new(),
            fluctuations: Vec::new(),
            status: DfaStatus::Estimated,
        };
        assess_health(m, &dfa, config)
    }

    fn metrics() -> MetricSet {
        MetricSet {
            bias: 0.0,
            slope: 0.0,
            noise_std: 0.1,
            snr_db: 40.0,
            hysteresis: 0.0,
            hurst: 0.5,
            hurst_r2: 0.99,
        }
    }

    #[test]
    fn test_nominal_diagnosis() {
        let m = metrics();
        let assessment = assess(&m, &AnalysisConfig::default());
        assert_eq!(diagnose(&assessment.scores, &m, "bar"), NOMINAL_DIAGNOSIS);
    }

    #[test]
    fn test_worst_metric_named_with_unit() {
        let mut m = metrics();
        m.bias = 1.5; // 12.5 penalty
        m.noise_std = 1.5; // 20 penalty
        let assessment = assess(&m, &AnalysisConfig::default());
        let text = diagnose(&assessment.scores, &m, "bar");
        assert!(text.starts_with("Noise"), "{text}");
        assert!(text.contains("1.5000 bar"), "{text}");
        assert!(text.contains("critical threshold 1.5000"), "{text}");
    }

    #[test]
    fn test_ties_broken_by_priority() {
        let mut m = metrics();
        m.slope = 0.5; // 30 (plateau)
        m.bias = -5.0; // 25
        let config = AnalysisConfig::default();
        let assessment = assess(&m, &config);
        assert!(diagnose(&assessment.scores, &m, "").starts_with("Drift"));

        // Equal penalties: bias outranks noise
        let mut m = metrics();
        m.bias = 1.5;
        let mut scores = assess(&m, &config).scores;
        scores[2].penalty = scores[1].penalty;
        assert!(diagnose(&scores, &m, "").starts_with("Bias"));
    }

    #[test]
    fn test_recommendation_lists_actions_in_priority_order() {
        let mut flags = BTreeSet::new();
        flags.insert(Flag::Warning(Metric::Noise));
        flags.insert(Flag::Critical(Metric::Slope));
        flags.insert(Flag::InsufficientData);
        let text = recommend(HealthStatus::Red, &flags);
        assert!(text.starts_with("Sensor health critical"));
        let slope_at = text.find("Recalibrate").expect("slope action");
        let noise_at = text.find("wiring").expect("noise action");
        assert!(slope_at < noise_at);
        assert!(text.contains("longer window"));

        let green = recommend(HealthStatus::Green, &BTreeSet::new());
        assert_eq!(green, "Sensor operating normally; continue routine monitoring.");
    }

    #[test]
    fn test_recommendation_names_each_flagged_metric_once() {
        let mut flags = BTreeSet::new();
        flags.insert(Flag::Critical(Metric::Dfa));
        flags.insert(Flag::Warning(Metric::Dfa));
        flags.insert(Flag::DfaUnreliable);
        let text = recommend(HealthStatus::Red, &flags);
        assert_eq!(text.matches("process memory").count(), 1, "{text}");
        assert!(!text.contains("Recalibrate"), "{text}");
    }

    fn rising_fit(slope: f64, n: usize) -> LinearFit {
        let values: Vec<f64> = (0..n).map(|i| 10.0 + slope * i as f64).collect();
        LinearFit::over_index(&values)
    }

    #[test]
    fn test_rul_insufficient_trend() {
        let flat = LinearFit::over_index(&[5.0; 100]);
        assert_eq!(predict_rul(&flat, 5.0, &AnalysisConfig::default(), None), "Insufficient trend");
    }

    #[test]
    fn test_rul_counts_samples_to_boundary() {
        // End value 10 + 0.01*99 = 10.99; boundary 12.0 -> 101 samples
        let fit = rising_fit(0.01, 100);
        let text = predict_rul(&fit, 10.0, &AnalysisConfig::default(), None);
        assert_eq!(text, "~101 samples");

        let with_time = predict_rul(
            &fit,
            10.0,
            &AnalysisConfig::default(),
            Some(chrono::Duration::seconds(5)),
        );
        assert_eq!(with_time, "~101 samples (~8 min)");
    }

    #[test]
    fn test_rul_falling_and_exceeded() {
        let falling = rising_fit(-0.05, 100);
        // End value 5.05 is already below 10 - 2
        assert_eq!(
            predict_rul(&falling, 10.0, &AnalysisConfig::default(), None),
            "Critical threshold exceeded"
        );
        let text = predict_rul(&falling, 5.0, &AnalysisConfig::default(), None);
        assert_eq!(text, "~41 samples");
    }

    #[test]
    fn test_format_duration_units() {
        assert_eq!(format_duration(30.0), "~30 s");
        assert_eq!(format_duration(420.0), "~7 min");
        assert_eq!(format_duration(5_400.0), "~1.5 hours");
        assert_eq!(format_duration(172_800.0), "~2.0 days");
    }
}

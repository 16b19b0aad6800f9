//! Analysis regression tests
//!
//! End-to-end checks of the one-shot pipeline against the synthetic
//! scenarios, plus DFA behaviour on known processes.

use std::io::Write;

use qorsense::processing::{detrended_fluctuation, DfaStatus};
use qorsense::sensors::read_csv_request;
use qorsense::{
    AnalysisRequest, HealthStatus, ReportSummary, Scenario, SensorAnalyzer, SensorType,
    SyntheticGenerator, ValidationError,
};

fn scenario_series(scenario: Scenario, length: usize, seed: u64) -> Vec<f64> {
    SyntheticGenerator::new(scenario, Some(seed))
        .generate(length)
        .expect("length > 0")
}

fn analyze(scenario: Scenario, seed: u64) -> qorsense::AnalysisResult {
    let values = scenario_series(scenario, 200, seed);
    SensorAnalyzer::default()
        .analyze_values("SIM-001", SensorType::Flow, &values)
        .expect("200 samples is enough")
}

// ============================================================================
// Scenario classification
// ============================================================================

#[test]
fn normal_scenario_is_healthy() {
    for seed in [0, 1, 7, 42, 99, 1234] {
        let result = analyze(Scenario::Normal, seed);
        assert_eq!(result.status, HealthStatus::Green, "seed {seed}: {result:?}");
        assert!(result.flags.is_empty(), "seed {seed}: {:?}", result.flags);
        assert_eq!(result.health_score, 100.0, "seed {seed}");
        assert!(result.metrics.noise_std < 0.7, "seed {seed}: {}", result.metrics.noise_std);
        assert!(result.metrics.slope.abs() < 0.01);
    }
}

#[test]
fn drifting_scenario_raises_slope_and_bias() {
    let result = analyze(Scenario::Drifting, 42);
    assert!(result.has_flag("SLOPE_WARNING"), "{:?}", result.flags);
    assert!(result.has_flag("BIAS_CRITICAL"), "{:?}", result.flags);
    assert_eq!(result.status, HealthStatus::Red);
    assert!((result.metrics.slope - 0.075).abs() < 0.01);
    assert!(result.diagnosis.starts_with("Bias"), "{}", result.diagnosis);
    assert!(result.diagnosis.contains("m³/h"), "{}", result.diagnosis);
    assert_eq!(result.prediction.as_deref(), Some("Critical threshold exceeded"));
}

#[test]
fn noisy_scenario_degrades_noise_and_snr() {
    let normal = analyze(Scenario::Normal, 42);
    let noisy = analyze(Scenario::Noisy, 42);
    assert!(noisy.metrics.noise_std > 2.0 * normal.metrics.noise_std);
    assert!(noisy.metrics.snr_db < normal.metrics.snr_db);
    assert!(noisy.has_flag("NOISE_CRITICAL"));
    assert_eq!(noisy.status, HealthStatus::Red);
    assert!(noisy.recommendation.contains("shielding"), "{}", noisy.recommendation);
}

#[test]
fn oscillation_scenario_is_noisy_about_its_trend() {
    let result = analyze(Scenario::Oscillation, 42);
    assert!(result.metrics.noise_std > 3.0, "{}", result.metrics.noise_std);
    assert!(result.has_flag("NOISE_CRITICAL"));
    assert_eq!(result.status, HealthStatus::Red);
}

#[test]
fn analysis_is_deterministic() {
    let values = scenario_series(Scenario::Noisy, 300, 5);
    let analyzer = SensorAnalyzer::default();
    let a = analyzer.analyze_values("X", SensorType::Generic, &values).expect("valid");
    let b = analyzer.analyze_values("X", SensorType::Generic, &values).expect("valid");
    assert_eq!(a.metrics, b.metrics);
    assert_eq!(a.health_score, b.health_score);
    assert_eq!(a.flags, b.flags);
    assert_eq!(a.diagnosis, b.diagnosis);
}

// ============================================================================
// DFA on known processes
// ============================================================================

#[test]
fn white_noise_has_hurst_near_half() {
    let values = scenario_series(Scenario::Normal, 2000, 42);
    let dfa = detrended_fluctuation(&values);
    assert_eq!(dfa.status, DfaStatus::Estimated);
    assert!((0.4..=0.6).contains(&dfa.hurst), "hurst {}", dfa.hurst);
    assert!(dfa.r_squared > 0.9, "r2 {}", dfa.r_squared);
}

#[test]
fn random_walk_is_persistent() {
    let steps = scenario_series(Scenario::Normal, 2000, 42);
    let walk: Vec<f64> = steps
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v - 10.0;
            Some(*acc)
        })
        .collect();
    let dfa = detrended_fluctuation(&walk);
    assert!(dfa.alpha > 1.0, "alpha {}", dfa.alpha);
    assert!((0.85..=1.0).contains(&dfa.hurst), "hurst {}", dfa.hurst);
}

// ============================================================================
// Input handling
// ============================================================================

#[test]
fn short_series_is_rejected_with_counts() {
    let values = scenario_series(Scenario::Normal, 30, 1);
    let err = SensorAnalyzer::default()
        .analyze_values("PT-1", SensorType::Pressure, &values)
        .expect_err("too short");
    assert_eq!(
        err,
        ValidationError::InsufficientData {
            needed: 50,
            available: 30
        }
    );
}

#[test]
fn missing_readings_are_dropped_before_length_check() {
    let mut values: Vec<Option<f64>> = scenario_series(Scenario::Normal, 60, 3)
        .into_iter()
        .map(Some)
        .collect();
    for slot in values.iter_mut().step_by(5) {
        *slot = None;
    }
    let request = AnalysisRequest {
        sensor_id: "FT-7".to_string(),
        sensor_type: SensorType::Flow,
        values,
        timestamps: None,
        config: None,
        setpoint: None,
    };
    let err = SensorAnalyzer::default().analyze(&request).expect_err("48 clean points");
    assert_eq!(
        err,
        ValidationError::InsufficientData {
            needed: 50,
            available: 48
        }
    );
}

#[test]
fn json_request_with_setpoint_and_override() {
    let values: Vec<String> = scenario_series(Scenario::Normal, 80, 42)
        .iter()
        .map(|v| format!("{v:.4}"))
        .collect();
    let json = format!(
        r#"{{
            "sensor_id": "TT-4",
            "sensor_type": "temperature",
            "values": [{}],
            "setpoint": 7.0,
            "config": {{ "bias_warning": 2.5, "bias_critical": 5.0 }}
        }}"#,
        values.join(", ")
    );
    let request = AnalysisRequest::from_json(&json).expect("valid JSON");
    assert_eq!(request.sensor_type, SensorType::Temperature);
    assert_eq!(request.setpoint, Some(7.0));

    let result = SensorAnalyzer::default().analyze(&request).expect("valid series");
    // Mean ~10 against setpoint 7: beyond the overridden warning only
    assert!((result.metrics.bias - 3.0).abs() < 0.3, "{}", result.metrics.bias);
    assert!(result.has_flag("BIAS_WARNING"));
    assert!(!result.has_flag("BIAS_CRITICAL"));
}

#[test]
fn unknown_request_field_is_malformed() {
    let err = AnalysisRequest::from_json(r#"{"sensor_id": "A", "values": [], "extra": 1}"#)
        .expect_err("unknown field");
    assert!(matches!(err, ValidationError::Malformed(_)));
}

#[test]
fn csv_file_analysis_with_timestamps() {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("temp file");
    writeln!(file, "timestamp,value").expect("write header");
    for i in 0..120u32 {
        writeln!(
            file,
            "2024-03-01T10:{:02}:{:02}Z,{:.3}",
            i / 60,
            i % 60,
            50.0 + 0.01 * f64::from(i)
        )
        .expect("write row");
    }

    let request = read_csv_request(file.path(), "PT-100", SensorType::Pressure).expect("valid CSV");
    assert_eq!(request.values.len(), 120);
    assert_eq!(request.timestamps.as_ref().map(Vec::len), Some(120));

    let detailed = SensorAnalyzer::default().analyze_detailed(&request).expect("valid");
    let prediction = detailed.result.prediction.clone().expect("prediction");
    assert!(prediction.starts_with('~'), "{prediction}");
    assert!(prediction.ends_with(')'), "{prediction}");

    let summary = ReportSummary::build(&detailed.result, &detailed.series.values)
        .with_dfa(&detailed.report.dfa);
    assert_eq!(summary.trend.count, 120);
    assert!(summary.trend.points.len() <= 100);
    assert!(summary.render_text().contains("PT-100"));
}

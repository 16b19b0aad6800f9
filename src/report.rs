//! Report summary - renderable view of one analysis
//!
//! A `ReportSummary` is plain data (metric table, trend snapshot, flags and
//! text) that can be serialized to JSON or rendered as text. No document
//! format is produced here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::config::defaults::REPORT_TREND_POINTS;
use crate::processing::DfaOutcome;
use crate::types::{AnalysisResult, HealthStatus};

/// One row of the metric table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    /// Title-cased metric name, e.g. "Noise Std"
    pub name: String,
    pub value: f64,
    /// Value rendered with four decimals
    pub formatted: String,
}

impl MetricRow {
    fn new(key: &str, value: f64) -> Self {
        Self {
            name: title_case(key),
            value,
            formatted: format!("{value:.4}"),
        }
    }
}

/// Down-sampled view of the analysed series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSnapshot {
    /// At most `REPORT_TREND_POINTS` bucket averages, in series order
    pub points: Vec<f64>,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub first: f64,
    pub last: f64,
    /// Number of samples summarised
    pub count: usize,
}

impl TrendSnapshot {
    /// Summarise `values` into at most `max_points` bucket-averaged points.
    ///
    /// An empty series gives an empty snapshot with zeroed statistics.
    pub fn from_values(values: &[f64], max_points: usize) -> Self {
        let n = values.len();
        if n == 0 || max_points == 0 {
            return Self {
                points: Vec::new(),
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                first: values.first().copied().unwrap_or(0.0),
                last: values.last().copied().unwrap_or(0.0),
                count: n,
            };
        }

        let points = if n <= max_points {
            values.to_vec()
        } else {
            (0..max_points)
                .map(|bucket| {
                    let start = bucket * n / max_points;
                    let end = (bucket + 1) * n / max_points;
                    let slice = &values[start..end];
                    slice.iter().sum::<f64>() / slice.len() as f64
                })
                .collect()
        };

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));

        Self {
            points,
            min,
            max,
            mean: values.iter().sum::<f64>() / n as f64,
            first: values[0],
            last: values[n - 1],
            count: n,
        }
    }
}

/// DFA log-log curve, attached when the detailed outcome is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DfaCurve {
    /// Unclamped scaling exponent
    pub alpha: f64,
    pub scales: Vec<usize>,
    pub fluctuations: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub sensor_id: String,
    pub analyzed_at: DateTime<Utc>,
    pub health_score: f64,
    pub status: HealthStatus,
    pub diagnosis: String,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
    pub flags: Vec<String>,
    pub metrics: Vec<MetricRow>,
    pub trend: TrendSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dfa: Option<DfaCurve>,
}

impl ReportSummary {
    /// Build a summary from a result and the series it was computed on.
    pub fn build(result: &AnalysisResult, values: &[f64]) -> Self {
        let m = &result.metrics;
        let metrics = [
            ("bias", m.bias),
            ("slope", m.slope),
            ("noise_std", m.noise_std),
            ("snr_db", m.snr_db),
            ("hysteresis", m.hysteresis),
            ("hurst", m.hurst),
            ("hurst_r2", m.hurst_r2),
        ]
        .into_iter()
        .map(|(key, value)| MetricRow::new(key, value))
        .collect();

        Self {
            sensor_id: result.sensor_id.clone(),
            analyzed_at: result.timestamp,
            health_score: result.health_score,
            status: result.status,
            diagnosis: result.diagnosis.clone(),
            recommendation: result.recommendation.clone(),
            prediction: result.prediction.clone(),
            flags: result.flags.iter().map(ToString::to_string).collect(),
            metrics,
            trend: TrendSnapshot::from_values(values, REPORT_TREND_POINTS),
            dfa: None,
        }
    }

    /// Attach the DFA curve from a detailed analysis.
    #[must_use]
    pub fn with_dfa(mut self, dfa: &DfaOutcome) -> Self {
        if !dfa.scales.is_empty() {
            self.dfa = Some(DfaCurve {
                alpha: dfa.alpha,
                scales: dfa.scales.clone(),
                fluctuations: dfa.fluctuations.clone(),
            });
        }
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text rendering for terminals and logs.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "QorSense Sensor Health Report");
        let _ = writeln!(out, "Sensor ID: {}", self.sensor_id);
        let _ = writeln!(out, "Analyzed:  {}", self.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC"));
        let _ = writeln!(out, "Health Score: {:.1} / 100 ({})", self.health_score, self.status);
        let _ = writeln!(out);
        let _ = writeln!(out, "Diagnosis: {}", self.diagnosis);
        let _ = writeln!(out, "Recommendation: {}", self.recommendation);
        if let Some(prediction) = &self.prediction {
            let _ = writeln!(out, "RUL: {prediction}");
        }
        if !self.flags.is_empty() {
            let _ = writeln!(out, "Flags: {}", self.flags.join(", "));
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{:<14} {:>12}", "Metric", "Value");
        for row in &self.metrics {
            let _ = writeln!(out, "{:<14} {:>12}", row.name, row.formatted);
        }
        let _ = writeln!(out);
        let t = &self.trend;
        let _ = writeln!(
            out,
            "Trend: {} samples, first {:.4}, last {:.4}, min {:.4}, max {:.4}, mean {:.4}",
            t.count, t.first, t.last, t.min, t.max, t.mean
        );
        out
    }
}

/// `noise_std` -> `Noise Std`
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

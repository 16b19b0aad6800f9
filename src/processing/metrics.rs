//! Metric engine - bias, drift, noise/SNR and hysteresis
//!
//! Each metric is a pure function over a validated window. `compute_metrics`
//! runs them all (plus DFA) and returns the intermediate OLS fit and DFA
//! outcome alongside the `MetricSet`, because scoring and RUL need them.

use statrs::statistics::Statistics;

use super::dfa::{detrended_fluctuation, DfaOutcome};
use super::preprocess::{Baseline, ValidatedSeries};
use super::regression::LinearFit;
use crate::config::defaults::SNR_CAP_DB;
use crate::types::MetricSet;

/// Metrics plus the intermediate results they were derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricReport {
    pub metrics: MetricSet,
    pub fit: LinearFit,
    pub dfa: DfaOutcome,
}

/// Compute every diagnostic metric over a validated series.
pub fn compute_metrics(series: &ValidatedSeries) -> MetricReport {
    let values = &series.values;
    let fit = LinearFit::over_index(values);
    let (noise_std, snr_db) = noise_and_snr(values, &fit);
    let dfa = detrended_fluctuation(values);

    let metrics = MetricSet {
        bias: bias(values, &series.baseline),
        slope: fit.slope,
        noise_std,
        snr_db,
        hysteresis: hysteresis(values),
        hurst: dfa.hurst,
        hurst_r2: dfa.r_squared,
    };

    tracing::trace!(
        n = values.len(),
        bias = metrics.bias,
        slope = metrics.slope,
        noise_std = metrics.noise_std,
        hurst = metrics.hurst,
        "Metrics computed"
    );

    MetricReport { metrics, fit, dfa }
}

/// Mean of the window minus the baseline.
///
/// A single-sample window, or a flat window measured against its own
/// reference window, has a bias of exactly 0.0.
pub fn bias(values: &[f64], baseline: &Baseline) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let flat = values.iter().all(|v| *v == values[0]);
    if flat && matches!(baseline, Baseline::ReferenceWindow { .. }) {
        return 0.0;
    }
    values.iter().mean() - baseline.value()
}

/// OLS slope of value against sample index.
pub fn slope(values: &[f64]) -> f64 {
    LinearFit::over_index(values).slope
}

/// Residual noise (population std about `fit`) and SNR in dB.
///
/// SNR is `20·log10(mean|x| / noise_std)` clamped to ±100 dB. Zero noise
/// reports the +100 dB cap and a zero-amplitude signal reports -100 dB.
pub fn noise_and_snr(values: &[f64], fit: &LinearFit) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, SNR_CAP_DB);
    }
    let residuals = fit.residuals_over_index(values);
    let noise_std = residuals.iter().population_std_dev();
    if !noise_std.is_finite() || noise_std == 0.0 {
        return (0.0, SNR_CAP_DB);
    }

    let mean_abs = values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64;
    let ratio = mean_abs / noise_std;
    let snr_db = if ratio > 0.0 {
        (20.0 * ratio.log10()).clamp(-SNR_CAP_DB, SNR_CAP_DB)
    } else {
        -SNR_CAP_DB
    };
    (noise_std, snr_db)
}

/// Normalised discrepancy between ascending and descending excursions.
///
/// Every adjacent pair is classified by the sign of its difference (flat
/// pairs are skipped) and contributes its midpoint to that direction. The
/// result is `|mean(asc) - mean(desc)| / (max - min)`, or 0 when either
/// direction is absent or the window has no range.
pub fn hysteresis(values: &[f64]) -> f64 {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let range = hi - lo;
    if !range.is_finite() || range <= 0.0 {
        return 0.0;
    }

    let (mut asc_sum, mut asc_n) = (0.0, 0usize);
    let (mut desc_sum, mut desc_n) = (0.0, 0usize);
    for pair in values.windows(2) {
        let midpoint = (pair[0] + pair[1]) / 2.0;
        if pair[1] > pair[0] {
            asc_sum += midpoint;
            asc_n += 1;
        } else if pair[1] < pair[0] {
            desc_sum += midpoint;
            desc_n += 1;
        }
    }
    if asc_n == 0 || desc_n == 0 {
        return 0.0;
    }

    let gap = asc_sum / asc_n as f64 - desc_sum / desc_n as f64;
    (gap.abs() / range).min(1.0)
}

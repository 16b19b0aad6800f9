//! Detrended fluctuation analysis
//!
//! Estimates the scaling exponent of a series: ~0.5 for uncorrelated noise,
//! above 0.5 for persistent (drifting, memoryful) behaviour. The reported
//! Hurst exponent is the exponent clamped to [0, 1].

use super::regression::LinearFit;
use crate::config::defaults::{
    DFA_FALLBACK_HURST, DFA_MIN_FLUCTUATION, DFA_MIN_SCALE, DFA_SCALE_COUNT,
};

/// How the estimate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DfaStatus {
    /// Log-log regression over at least two scales
    Estimated,
    /// Fewer than two usable scales; fallback values reported
    TooShort,
    /// Zero fluctuation at every scale (constant series)
    Degenerate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DfaOutcome {
    /// Scaling exponent clamped to [0, 1]
    pub hurst: f64,
    /// Raw log-log slope
    pub alpha: f64,
    /// R² of the log-log regression
    pub r_squared: f64,
    /// Window lengths that produced a usable fluctuation
    pub scales: Vec<usize>,
    /// F(s) for each entry of `scales`
    pub fluctuations: Vec<f64>,
    pub status: DfaStatus,
}

impl DfaOutcome {
    fn fallback(status: DfaStatus) -> Self {
        Self {
            hurst: DFA_FALLBACK_HURST,
            alpha: DFA_FALLBACK_HURST,
            r_squared: 0.0,
            scales: Vec::new(),
            fluctuations: Vec::new(),
            status,
        }
    }

    /// Whether the estimate is good enough to be scored.
    pub fn is_reliable(&self, min_r_squared: f64) -> bool {
        self.status == DfaStatus::Estimated && self.r_squared >= min_r_squared
    }
}

/// Run DFA over `values`.
pub fn detrended_fluctuation(values: &[f64]) -> DfaOutcome {
    let n = values.len();
    let scales = candidate_scales(n);
    if scales.len() < 2 {
        return DfaOutcome::fallback(DfaStatus::TooShort);
    }

    // Integrated, mean-removed profile
    let mean = values.iter().sum::<f64>() / n as f64;
    let profile: Vec<f64> = values
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v - mean;
            Some(*acc)
        })
        .collect();

    let mut used_scales = Vec::with_capacity(scales.len());
    let mut fluctuations = Vec::with_capacity(scales.len());
    for s in scales {
        let f = fluctuation(&profile, s);
        if f.is_finite() && f > DFA_MIN_FLUCTUATION {
            used_scales.push(s);
            fluctuations.push(f);
        }
    }

    if used_scales.is_empty() {
        return DfaOutcome::fallback(DfaStatus::Degenerate);
    }
    if used_scales.len() < 2 {
        return DfaOutcome::fallback(DfaStatus::TooShort);
    }

    let log_s: Vec<f64> = used_scales.iter().map(|&s| (s as f64).ln()).collect();
    let log_f: Vec<f64> = fluctuations.iter().map(|f| f.ln()).collect();
    let fit = LinearFit::fit(&log_s, &log_f);

    DfaOutcome {
        hurst: fit.slope.clamp(0.0, 1.0),
        alpha: fit.slope,
        r_squared: fit.r_squared,
        scales: used_scales,
        fluctuations,
        status: DfaStatus::Estimated,
    }
}

/// Log-spaced, rounded, deduplicated window lengths in `[4, n/4]`.
fn candidate_scales(n: usize) -> Vec<usize> {
    let max_scale = n / 4;
    if max_scale < DFA_MIN_SCALE {
        return Vec::new();
    }
    if max_scale == DFA_MIN_SCALE {
        return vec![DFA_MIN_SCALE];
    }

    let lo = (DFA_MIN_SCALE as f64).ln();
    let hi = (max_scale as f64).ln();
    let steps = (DFA_SCALE_COUNT - 1) as f64;
    let mut scales: Vec<usize> = (0..DFA_SCALE_COUNT)
        .map(|i| (lo + (hi - lo) * i as f64 / steps).exp().round() as usize)
        .map(|s| s.clamp(DFA_MIN_SCALE, max_scale))
        .collect();
    scales.dedup();
    scales
}

/// Root-mean-square residual of the per-window linear detrend at scale `s`.
///
/// Windows are taken from the start and, when `s` does not divide the
/// profile length, again from the end so no sample is ignored.
fn fluctuation(profile: &[f64], s: usize) -> f64 {
    let n = profile.len();
    let windows = n / s;
    if windows == 0 {
        return 0.0;
    }

    let x: Vec<f64> = (0..s).map(|i| i as f64).collect();
    let window_variance = |segment: &[f64]| -> f64 {
        let fit = LinearFit::fit(&x, segment);
        let ssr: f64 = segment
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let r = v - fit.predict(i as f64);
                r * r
            })
            .sum();
        ssr / s as f64
    };

    let mut variances: Vec<f64> = profile.chunks_exact(s).map(window_variance).collect();
    if n % s != 0 {
        variances.extend(profile.rchunks_exact(s).map(window_variance));
    }

    (variances.iter().sum::<f64>() / variances.len() as f64).sqrt()
}

//! Ordinary least squares
//!
//! One fit serves slope, residual noise, RUL extrapolation and every DFA
//! window, so the degenerate cases are handled here once.

use statrs::statistics::Statistics;

/// Result of a simple linear regression `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Number of points fitted
    pub n: usize,
}

impl LinearFit {
    /// Fit `values` against their sample index `0..n`.
    pub fn over_index(values: &[f64]) -> Self {
        let x: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
        Self::fit(&x, values)
    }

    /// Fit `y` against `x`.
    ///
    /// Fewer than two points, a constant `x` or a constant `y` yield a flat
    /// line through the mean with slope exactly 0.0.
    pub fn fit(x: &[f64], y: &[f64]) -> Self {
        let n = x.len().min(y.len());
        let flat = |level: f64| Self {
            slope: 0.0,
            intercept: level,
            r_squared: 0.0,
            n,
        };

        if n == 0 {
            return flat(0.0);
        }
        let (x, y) = (&x[..n], &y[..n]);
        if n < 2 || y.iter().all(|v| *v == y[0]) {
            return flat(y[0]);
        }

        let mean_x = x.iter().mean();
        let mean_y = y.iter().mean();

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        let mut syy = 0.0;
        for (xi, yi) in x.iter().zip(y) {
            let dx = xi - mean_x;
            let dy = yi - mean_y;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }

        if sxx == 0.0 {
            return flat(mean_y);
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        let r_squared = if syy > 0.0 {
            ((sxy * sxy) / (sxx * syy)).min(1.0)
        } else {
            0.0
        };

        Self {
            slope,
            intercept,
            r_squared,
            n,
        }
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Fitted value at the last sample index.
    pub fn end_value(&self) -> f64 {
        self.predict(self.n.saturating_sub(1) as f64)
    }

    /// Residuals of `values` against this fit, with `x` = sample index.
    pub fn residuals_over_index(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| v - self.predict(i as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_line() {
        let values: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();
        let fit = LinearFit::over_index(&values);
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert!((fit.end_value() - 21.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_series_has_exact_zero_slope() {
        let values = vec![7.3; 64];
        let fit = LinearFit::over_index(&values);
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 7.3);
        assert!(fit.residuals_over_index(&values).iter().all(|r| *r == 0.0));
    }

    #[test]
    fn test_degenerate_inputs() {
        let empty = LinearFit::over_index(&[]);
        assert_eq!(empty.slope, 0.0);
        let single = LinearFit::over_index(&[4.0]);
        assert_eq!(single.slope, 0.0);
        assert_eq!(single.intercept, 4.0);
        let same_x = LinearFit::fit(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]);
        assert_eq!(same_x.slope, 0.0);
        assert!((same_x.intercept - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_noisy_line_recovers_slope() {
        let values: Vec<f64> = (0..100)
            .map(|i| 0.5 * i as f64 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let fit = LinearFit::over_index(&values);
        assert!((fit.slope - 0.5).abs() < 0.01);
        assert!(fit.r_squared > 0.99);
    }

    #[test]
    fn test_alternating_series_has_no_trend() {
        let values: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let fit = LinearFit::over_index(&values);
        assert!(fit.slope.abs() < 0.001);
        assert!(fit.r_squared < 0.01);
    }

    #[test]
    fn test_fit_carries_only_line_statistics() {
        // Slope, intercept, R² and n are all a fit reports
        let fit = LinearFit::over_index(&[1.0, 2.0, 4.0]);
        let LinearFit { slope, intercept, r_squared, n } = fit;
        assert!((slope - 1.5).abs() < 1e-12);
        assert!((intercept - 5.0 / 6.0).abs() < 1e-12);
        assert!(r_squared > 0.9 && r_squared < 1.0);
        assert_eq!(n, 3);
    }
}

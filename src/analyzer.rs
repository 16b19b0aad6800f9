//! Sensor analyzer - orchestrates the one-shot analysis pipeline
//!
//! 1. Preprocessing (drop non-finite readings, enforce minimum length, baseline)
//! 2. Metric engine (bias, slope, noise/SNR, hysteresis, DFA)
//! 3. Health scoring (penalties, flags, status)
//! 4. Diagnosis, recommendation and RUL text
//!
//! Analysis is synchronous and pure: the same request always yields the same
//! metrics, score, flags and status (only the result timestamp differs).

use chrono::Utc;

use crate::config::AnalysisConfig;
use crate::processing::{
    assess_health, compute_metrics, diagnose, predict_rul, preprocess, recommend, sample_period,
    HealthAssessment, MetricReport, ValidatedSeries, ValidationError,
};
use crate::types::{AnalysisRequest, AnalysisResult, SensorType};

/// Full pipeline output, for callers that need more than the result (reports).
#[derive(Debug, Clone)]
pub struct DetailedAnalysis {
    pub result: AnalysisResult,
    pub series: ValidatedSeries,
    pub report: MetricReport,
    pub assessment: HealthAssessment,
}

/// Runs the analysis pipeline with a validated threshold set.
#[derive(Debug, Clone)]
pub struct SensorAnalyzer {
    config: AnalysisConfig,
}

impl Default for SensorAnalyzer {
    fn default() -> Self {
        Self {
            config: AnalysisConfig::default(),
        }
    }
}

impl SensorAnalyzer {
    /// Create an analyzer; inconsistent thresholds are rejected up front.
    pub fn new(config: AnalysisConfig) -> Result<Self, ValidationError> {
        config.validate().map_err(ValidationError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze one request.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ValidationError> {
        self.analyze_detailed(request).map(|detailed| detailed.result)
    }

    /// Analyze a plain series without timestamps or setpoint.
    pub fn analyze_values(
        &self,
        sensor_id: &str,
        sensor_type: SensorType,
        values: &[f64],
    ) -> Result<AnalysisResult, ValidationError> {
        self.analyze(&AnalysisRequest::new(sensor_id, sensor_type, values))
    }

    /// Analyze one request and keep every intermediate stage.
    ///
    /// A per-request `config` replaces the analyzer's thresholds for this call
    /// only, after the same validation `new` applies.
    pub fn analyze_detailed(
        &self,
        request: &AnalysisRequest,
    ) -> Result<DetailedAnalysis, ValidationError> {
        let config = match &request.config {
            Some(override_config) => {
                override_config
                    .validate()
                    .map_err(ValidationError::InvalidConfig)?;
                override_config
            }
            None => &self.config,
        };

        let series = preprocess(
            &request.values,
            request.timestamps.as_deref(),
            request.setpoint,
            config,
        )
        .map_err(|e| {
            tracing::debug!(sensor_id = %request.sensor_id, error = %e, "Request failed validation");
            e
        })?;

        let report = compute_metrics(&series);
        let assessment = assess_health(&report.metrics, &report.dfa, config);

        let unit = request.sensor_type.unit();
        let diagnosis = diagnose(&assessment.scores, &report.metrics, unit);
        let recommendation = recommend(assessment.status, &assessment.flags);
        let period = series.timestamps.as_deref().and_then(sample_period);
        let prediction = predict_rul(&report.fit, series.baseline.value(), config, period);

        tracing::debug!(
            sensor_id = %request.sensor_id,
            bias = report.metrics.bias,
            slope = report.metrics.slope,
            noise_std = report.metrics.noise_std,
            snr_db = report.metrics.snr_db,
            hysteresis = report.metrics.hysteresis,
            hurst = report.metrics.hurst,
            hurst_r2 = report.metrics.hurst_r2,
            "Metric details"
        );
        tracing::info!(
            sensor_id = %request.sensor_id,
            sensor_type = %request.sensor_type,
            samples = series.len(),
            dropped = series.dropped,
            health_score = assessment.health_score,
            status = %assessment.status,
            "Analysis complete"
        );

        let result = AnalysisResult {
            sensor_id: request.sensor_id.clone(),
            timestamp: Utc::now(),
            health_score: assessment.health_score,
            status: assessment.status,
            diagnosis,
            metrics: report.metrics,
            flags: assessment.flags.clone(),
            recommendation,
            prediction: Some(prediction),
        };

        Ok(DetailedAnalysis {
            result,
            series,
            report,
            assessment,
        })
    }
}

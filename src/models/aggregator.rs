//! Consensus scoring across the four classifiers

use crate::config::ScoringConfig;
use crate::error::ScoringError;
use crate::feature_extractor::FeatureExtractor;
use crate::metrics::ScoringMetrics;
use crate::models::registry::ModelRegistry;
use crate::types::{AggregateResult, ModelKey, ModelScore, TransactionRecord};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Runs a record through every registered model and summarizes the scores.
pub struct PredictionAggregator {
    extractor: FeatureExtractor,
    alert_threshold: f64,
    model_threshold: f64,
    metrics: Option<Arc<ScoringMetrics>>,
}

impl PredictionAggregator {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            alert_threshold: config.alert_threshold,
            model_threshold: config.model_threshold,
            metrics: None,
        }
    }

    /// Record per-model inference time into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<ScoringMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Score one record against every model.
    ///
    /// Fails on the first model that cannot produce a valid score; a partial
    /// result is never returned.
    pub fn score(
        &self,
        record: &TransactionRecord,
        registry: &ModelRegistry,
    ) -> Result<AggregateResult, ScoringError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let features = self.extractor.extract(record);

        let mut scores = BTreeMap::new();
        for key in ModelKey::ALL {
            match self.score_model(key, &features, registry) {
                Ok(score) => {
                    debug!(
                        request_id = %request_id,
                        model = %key,
                        fraud_probability = score.fraud_probability,
                        "Model scored"
                    );
                    scores.insert(key, score);
                }
                Err(e) => {
                    error!(request_id = %request_id, model = %key, error = %e, "Scoring failed");
                    return Err(e);
                }
            }
        }

        let fraud: Vec<f64> = scores.values().map(|s| s.fraud_probability).collect();
        let mean_fraud_probability = fraud.iter().sum::<f64>() / fraud.len() as f64;
        let max_fraud_probability = fraud.iter().copied().fold(0.0, f64::max);
        let models_flagging = fraud.iter().filter(|&&p| p > self.model_threshold).count();

        debug!(
            request_id = %request_id,
            mean = mean_fraud_probability,
            max = max_fraud_probability,
            models_flagging = models_flagging,
            "Aggregate computed"
        );

        Ok(AggregateResult {
            request_id,
            scores,
            mean_fraud_probability,
            max_fraud_probability,
            alert_threshold: self.alert_threshold,
            is_fraud_alert: mean_fraud_probability > self.alert_threshold,
            models_flagging,
            scored_at: Utc::now(),
        })
    }

    fn score_model(
        &self,
        key: ModelKey,
        features: &[f32],
        registry: &ModelRegistry,
    ) -> Result<ModelScore, ScoringError> {
        let model = registry.get(key).ok_or(ScoringError::MissingModel(key))?;

        if let Some(expected) = model.classifier.expected_features() {
            if expected != features.len() {
                return Err(ScoringError::FeatureLength {
                    key,
                    expected,
                    actual: features.len(),
                });
            }
        }

        let started = Instant::now();
        let raw = model
            .classifier
            .predict_proba(features)
            .map_err(|source| ScoringError::Inference { key, source })?;
        if let Some(metrics) = &self.metrics {
            metrics.record_model_time(key, started.elapsed());
        }

        (model.adapter)(&raw).map_err(|reason| ScoringError::MalformedOutput { key, reason })
    }
}

impl Default for PredictionAggregator {
    fn default() -> Self {
        Self::new(&ScoringConfig::default())
    }
}

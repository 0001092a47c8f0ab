use anyhow::Result;
use fraud_scoring::models::adapter::{named_pair, positional_pair};
use fraud_scoring::models::{Classifier, ModelRegistry, PredictionAggregator, RawOutput};
use fraud_scoring::types::ModelKey;
use fraud_scoring::validator::validate;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

struct Fixed(RawOutput);

impl Classifier for Fixed {
    fn predict_proba(&self, _features: &[f32]) -> Result<RawOutput> {
        Ok(self.0.clone())
    }
}

fn registry(p: &[f64]) -> ModelRegistry {
    ModelRegistry::builder()
        .register(ModelKey::Logistic, Fixed(RawOutput::positional(&[1.0 - p[0], p[0]])), positional_pair)
        .register(ModelKey::KNeighbors, Fixed(RawOutput::positional(&[1.0 - p[1], p[1]])), positional_pair)
        .register(
            ModelKey::Svc,
            Fixed(RawOutput::named([("non_fraud", 1.0 - p[2]), ("fraud", p[2])])),
            named_pair,
        )
        .register(ModelKey::Tree, Fixed(RawOutput::positional(&[1.0 - p[3], p[3]])), positional_pair)
        .build()
        .unwrap()
}

fn record_strategy() -> impl Strategy<Value = Map<String, Value>> {
    (
        0.0..1.0e5_f64,
        0u32..=86_400,
        prop::collection::vec(-50.0..50.0_f64, 28),
    )
        .prop_map(|(amount, time, components)| {
            let mut raw = Map::new();
            raw.insert("amount".to_string(), json!(amount));
            raw.insert("time".to_string(), json!(time));
            for (i, v) in components.into_iter().enumerate() {
                raw.insert(format!("v{}", i + 1), json!(v));
            }
            raw
        })
}

#[test]
fn aggregate_matches_model_scores() {
    proptest!(|(raw in record_strategy(), p in prop::collection::vec(0.0..=1.0_f64, 4))| {
        let record = validate(&raw).unwrap();
        let result = PredictionAggregator::default().score(&record, &registry(&p)).unwrap();

        prop_assert_eq!(result.scores.len(), 4);

        let fraud: Vec<f64> = result.scores.values().map(|s| s.fraud_probability).collect();
        for score in result.scores.values() {
            prop_assert!((score.normal_probability + score.fraud_probability - 1.0).abs() < 1e-6);
            prop_assert!((0.0..=1.0).contains(&score.fraud_probability));
        }

        let mean = fraud.iter().sum::<f64>() / 4.0;
        let max = fraud.iter().copied().fold(f64::MIN, f64::max);
        prop_assert!((result.mean_fraud_probability - mean).abs() < 1e-12);
        prop_assert_eq!(result.max_fraud_probability, max);
        prop_assert_eq!(result.is_fraud_alert, result.mean_fraud_probability > 0.5);
    });
}

#[test]
fn valid_records_always_validate() {
    proptest!(|(raw in record_strategy())| {
        let record = validate(&raw).unwrap();
        prop_assert!(record.amount() >= 0.0);
        prop_assert!(record.time() <= 86_400);
    });
}

#[test]
fn removing_any_field_is_rejected() {
    proptest!(|(raw in record_strategy(), idx in 0usize..30)| {
        let mut raw = raw;
        let name = raw.keys().nth(idx).cloned().unwrap();
        raw.remove(&name);

        let err = validate(&raw).unwrap_err();
        prop_assert_eq!(err.fields(), vec![name.as_str()]);
    });
}

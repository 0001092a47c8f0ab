//! Per-model output normalization.
//!
//! Each registered model carries one adapter that turns its raw output into
//! the canonical [`ModelScore`]. The aggregator only ever calls the adapter;
//! it never inspects which model produced an output.

use crate::models::inference::RawOutput;
use crate::types::ModelScore;
use serde::Deserialize;

/// Largest accepted deviation of a raw pair's sum from 1
pub const SUM_TOLERANCE: f64 = 1e-4;

/// Pure normalization function registered alongside a model
pub type OutputAdapter = fn(&RawOutput) -> Result<ModelScore, String>;

/// Output shape a model reports, selectable per model in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputShape {
    /// `[normal, fraud]`
    Positional,
    /// `{"non_fraud": .., "fraud": ..}`
    Named,
}

impl OutputShape {
    pub fn adapter(&self) -> OutputAdapter {
        match self {
            OutputShape::Positional => positional_pair,
            OutputShape::Named => named_pair,
        }
    }
}

/// Normalize `[normal, fraud]`.
pub fn positional_pair(raw: &RawOutput) -> Result<ModelScore, String> {
    match raw {
        RawOutput::Positional(values) if values.len() == 2 => normalize(values[0], values[1]),
        RawOutput::Positional(values) => {
            Err(format!("expected 2 class probabilities, got {}", values.len()))
        }
        RawOutput::Named(_) => Err("expected a positional pair, got named fields".to_string()),
    }
}

/// Normalize `{"non_fraud": .., "fraud": ..}`.
pub fn named_pair(raw: &RawOutput) -> Result<ModelScore, String> {
    let RawOutput::Named(fields) = raw else {
        return Err("expected named fields, got a positional output".to_string());
    };

    if fields.len() != 2 {
        return Err(format!("expected 2 named probabilities, got {}", fields.len()));
    }

    let normal = fields
        .get("non_fraud")
        .ok_or_else(|| "missing 'non_fraud' probability".to_string())?;
    let fraud = fields
        .get("fraud")
        .ok_or_else(|| "missing 'fraud' probability".to_string())?;

    normalize(*normal, *fraud)
}

fn normalize(normal: f64, fraud: f64) -> Result<ModelScore, String> {
    for (name, p) in [("normal", normal), ("fraud", fraud)] {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(format!("{} probability {} outside [0, 1]", name, p));
        }
    }

    let sum = normal + fraud;
    if (sum - 1.0).abs() > SUM_TOLERANCE {
        return Err(format!("probabilities sum to {}, expected 1", sum));
    }

    // Rescale away float32 rounding so the pair sums to 1
    Ok(ModelScore {
        normal_probability: normal / sum,
        fraud_probability: fraud / sum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_pair() {
        let score = positional_pair(&RawOutput::positional(&[0.8, 0.2])).unwrap();
        assert!((score.normal_probability - 0.8).abs() < 1e-12);
        assert!((score.fraud_probability - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_named_pair() {
        let raw = RawOutput::named([("non_fraud", 0.35), ("fraud", 0.65)]);
        let score = named_pair(&raw).unwrap();
        assert!((score.fraud_probability - 0.65).abs() < 1e-12);
        assert!((score.normal_probability - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_wrong_arity() {
        let err = positional_pair(&RawOutput::positional(&[0.2, 0.3, 0.5])).unwrap_err();
        assert!(err.contains("got 3"));

        let err = named_pair(&RawOutput::named([("fraud", 1.0)])).unwrap_err();
        assert!(err.contains("got 1"));
    }

    #[test]
    fn test_rejects_mismatched_shape() {
        assert!(positional_pair(&RawOutput::named([("non_fraud", 0.5), ("fraud", 0.5)])).is_err());
        assert!(named_pair(&RawOutput::positional(&[0.5, 0.5])).is_err());
    }

    #[test]
    fn test_rejects_missing_name() {
        let raw = RawOutput::named([("normal", 0.5), ("fraud", 0.5)]);
        assert_eq!(named_pair(&raw).unwrap_err(), "missing 'non_fraud' probability");
    }

    #[test]
    fn test_rejects_invalid_probabilities() {
        assert!(positional_pair(&RawOutput::positional(&[1.2, -0.2])).is_err());
        assert!(positional_pair(&RawOutput::positional(&[f64::NAN, 0.5])).is_err());
        assert!(positional_pair(&RawOutput::positional(&[0.4, 0.4])).is_err());
    }

    #[test]
    fn test_renormalizes_float32_rounding() {
        let raw = RawOutput::positional(&[0.3_f32 as f64, 0.7_f32 as f64]);
        let score = positional_pair(&raw).unwrap();
        let sum = score.normal_probability + score.fraud_probability;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shape_selects_adapter() {
        let raw = RawOutput::named([("non_fraud", 0.9), ("fraud", 0.1)]);
        assert!(OutputShape::Named.adapter()(&raw).is_ok());
        assert!(OutputShape::Positional.adapter()(&raw).is_err());
    }
}

//! Error taxonomy for loading, validation and scoring

use crate::types::ModelKey;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal: the model set could not be assembled, nothing can be scored.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model artifact for '{key}' not found at {}", .path.display())]
    Missing { key: ModelKey, path: PathBuf },

    #[error("failed to deserialize model '{key}' from {}: {source}", .path.display())]
    Deserialize {
        key: ModelKey,
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    #[error("ONNX Runtime initialization failed: {0}")]
    Runtime(#[source] ort::Error),

    #[error("incomplete model set, missing: {}", join_keys(.0))]
    Incomplete(Vec<ModelKey>),
}

/// One problem found in a raw transaction record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldIssue {
    Missing(String),
    Unexpected(String),
    NotNumeric(String),
    NotInteger(String),
    OutOfRange { field: String, reason: String },
}

impl FieldIssue {
    /// Name of the offending field
    pub fn field(&self) -> &str {
        match self {
            FieldIssue::Missing(f)
            | FieldIssue::Unexpected(f)
            | FieldIssue::NotNumeric(f)
            | FieldIssue::NotInteger(f) => f,
            FieldIssue::OutOfRange { field, .. } => field,
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldIssue::Missing(field) => write!(f, "'{}' is missing", field),
            FieldIssue::Unexpected(field) => write!(f, "'{}' is not an expected field", field),
            FieldIssue::NotNumeric(field) => write!(f, "'{}' must be a number", field),
            FieldIssue::NotInteger(field) => write!(f, "'{}' must be an integer", field),
            FieldIssue::OutOfRange { field, reason } => write!(f, "'{}' {}", field, reason),
        }
    }
}

/// Recoverable: the record was rejected before scoring.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid transaction: {}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Names of every field that failed, in the order checked
    pub fn fields(&self) -> Vec<&str> {
        self.issues.iter().map(FieldIssue::field).collect()
    }
}

/// Recoverable: one model could not produce a usable score.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("no model registered for '{0}'")]
    MissingModel(ModelKey),

    #[error("model '{key}' expects {expected} features, got {actual}")]
    FeatureLength {
        key: ModelKey,
        expected: usize,
        actual: usize,
    },

    #[error("model '{key}' failed during inference: {source}")]
    Inference {
        key: ModelKey,
        #[source]
        source: anyhow::Error,
    },

    #[error("model '{key}' returned a malformed output: {reason}")]
    MalformedOutput { key: ModelKey, reason: String },
}

impl ScoringError {
    /// Key of the model that failed
    pub fn key(&self) -> ModelKey {
        match self {
            ScoringError::MissingModel(key) => *key,
            ScoringError::FeatureLength { key, .. }
            | ScoringError::Inference { key, .. }
            | ScoringError::MalformedOutput { key, .. } => *key,
        }
    }
}

/// Any failure surfaced to the front-end
#[derive(Debug, Error)]
pub enum FraudScoringError {
    #[error("model registry: {0}")]
    Load(#[from] ModelLoadError),

    #[error("validator: {0}")]
    Validation(#[from] ValidationError),

    #[error("aggregator: {0}")]
    Scoring(#[from] ScoringError),

    #[error("input: malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("input: expected a JSON object of field names to numbers")]
    NotAnObject,
}

pub type Result<T> = std::result::Result<T, FraudScoringError>;

fn join_keys(keys: &[ModelKey]) -> String {
    keys.iter()
        .map(ModelKey::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_fields() {
        let err = ValidationError {
            issues: vec![
                FieldIssue::Missing("v3".to_string()),
                FieldIssue::OutOfRange {
                    field: "amount".to_string(),
                    reason: "must be >= 0".to_string(),
                },
            ],
        };

        assert_eq!(err.fields(), vec!["v3", "amount"]);
        let message = err.to_string();
        assert!(message.contains("'v3' is missing"));
        assert!(message.contains("'amount' must be >= 0"));
    }

    #[test]
    fn test_scoring_error_carries_key() {
        let err = ScoringError::MalformedOutput {
            key: ModelKey::Svc,
            reason: "expected 2 values, got 3".to_string(),
        };

        assert_eq!(err.key(), ModelKey::Svc);
        assert!(err.to_string().contains("'svc'"));

        let wrapped = FraudScoringError::from(err);
        assert!(wrapped.to_string().starts_with("aggregator:"));
    }

    #[test]
    fn test_incomplete_lists_keys() {
        let err = ModelLoadError::Incomplete(vec![ModelKey::Svc, ModelKey::Tree]);
        assert_eq!(err.to_string(), "incomplete model set, missing: svc, tree");
    }
}

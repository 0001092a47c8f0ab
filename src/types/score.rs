//! Score data structures produced by the prediction aggregator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Stable identifier of one of the four classifiers.
///
/// Variant order is the display order used everywhere results are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKey {
    Logistic,
    KNeighbors,
    Svc,
    Tree,
}

impl ModelKey {
    /// Every key, in display order.
    pub const ALL: [ModelKey; 4] = [
        ModelKey::Logistic,
        ModelKey::KNeighbors,
        ModelKey::Svc,
        ModelKey::Tree,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKey::Logistic => "logistic",
            ModelKey::KNeighbors => "kneighbors",
            ModelKey::Svc => "svc",
            ModelKey::Tree => "tree",
        }
    }

    /// Human-readable algorithm name
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKey::Logistic => "Logistic Regression",
            ModelKey::KNeighbors => "K-Neighbors",
            ModelKey::Svc => "SVM",
            ModelKey::Tree => "Decision Tree",
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown model key '{}'", s))
    }
}

/// Per-model classification label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Fraude,
    Normal,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Fraude => f.pad("FRAUDE"),
            Verdict::Normal => f.pad("NORMAL"),
        }
    }
}

/// Canonical probability pair reported by one model.
///
/// Both values lie in `[0, 1]` and sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub normal_probability: f64,
    pub fraud_probability: f64,
}

impl ModelScore {
    /// Build a score from the fraud probability alone
    pub fn from_fraud(fraud_probability: f64) -> Self {
        Self {
            normal_probability: 1.0 - fraud_probability,
            fraud_probability,
        }
    }

    /// Label this score against a per-model threshold (strictly greater is fraud).
    pub fn verdict(&self, threshold: f64) -> Verdict {
        if self.fraud_probability > threshold {
            Verdict::Fraude
        } else {
            Verdict::Normal
        }
    }
}

/// Colour band of the mean fraud probability, as drawn on the gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    /// Determine the band from a probability and band boundaries
    pub fn from_probability(probability: f64, bands: &RiskBandThresholds) -> Self {
        if probability >= bands.high {
            RiskBand::High
        } else if probability >= bands.low {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }
}

/// Configurable gauge band boundaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskBandThresholds {
    pub low: f64,
    pub high: f64,
}

impl Default for RiskBandThresholds {
    fn default() -> Self {
        Self { low: 0.3, high: 0.7 }
    }
}

/// Consensus result of scoring one transaction against every model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Unique identifier of this scoring call
    pub request_id: String,

    /// Normalized score of every model, keyed in display order
    pub scores: BTreeMap<ModelKey, ModelScore>,

    /// Arithmetic mean of the fraud probabilities
    pub mean_fraud_probability: f64,

    /// Largest fraud probability
    pub max_fraud_probability: f64,

    /// Mean threshold the alert was derived with
    pub alert_threshold: f64,

    /// `mean_fraud_probability > alert_threshold`
    pub is_fraud_alert: bool,

    /// Number of models whose own verdict is fraud
    pub models_flagging: usize,

    pub scored_at: DateTime<Utc>,
}

impl AggregateResult {
    /// Fraud probabilities in display order
    pub fn fraud_probabilities(&self) -> Vec<(ModelKey, f64)> {
        self.scores
            .iter()
            .map(|(key, score)| (*key, score.fraud_probability))
            .collect()
    }

    pub fn score(&self, key: ModelKey) -> Option<&ModelScore> {
        self.scores.get(&key)
    }
}

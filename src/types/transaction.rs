//! Validated transaction record

use serde::Serialize;
use serde_json::{Map, Value};

/// Number of anonymized PCA components (`v1..v28`)
pub const PCA_COMPONENTS: usize = 28;

/// Largest accepted `time` value (seconds since midnight, inclusive)
pub const SECONDS_PER_DAY: u32 = 86_400;

/// A transaction that passed validation.
///
/// Only [`crate::validator::validate`] constructs one, so every instance
/// satisfies the field invariants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub(crate) amount: f64,
    pub(crate) time: u32,
    pub(crate) components: [f64; PCA_COMPONENTS],
}

impl TransactionRecord {
    /// Transaction amount, never negative
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Seconds since midnight, in `0..=86400`
    pub fn time(&self) -> u32 {
        self.time
    }

    /// Component `v{index}` for `index` in `1..=28`
    pub fn component(&self, index: usize) -> Option<f64> {
        index
            .checked_sub(1)
            .and_then(|i| self.components.get(i))
            .copied()
    }

    pub fn components(&self) -> &[f64; PCA_COMPONENTS] {
        &self.components
    }

    /// Field-name-to-value mapping, the shape the validator accepts
    pub fn to_raw(&self) -> Map<String, Value> {
        let mut raw = Map::new();
        raw.insert("amount".to_string(), Value::from(self.amount));
        raw.insert("time".to_string(), Value::from(self.time));
        for (i, v) in self.components.iter().enumerate() {
            raw.insert(format!("v{}", i + 1), Value::from(*v));
        }
        raw
    }
}

/// Field names in the order every model consumes them
pub fn field_names() -> Vec<String> {
    let mut names = Vec::with_capacity(PCA_COMPONENTS + 2);
    names.push("amount".to_string());
    names.push("time".to_string());
    names.extend((1..=PCA_COMPONENTS).map(|i| format!("v{}", i)));
    names
}

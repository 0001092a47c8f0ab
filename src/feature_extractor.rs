//! Feature extraction for model inference.
//!
//! Every model was trained on the same column order:
//! `[amount, time, v1, v2, ..., v28]`. Changing this order silently
//! corrupts every prediction.

use crate::types::transaction::{TransactionRecord, PCA_COMPONENTS};

/// Length of the feature vector
pub const FEATURE_COUNT: usize = PCA_COMPONENTS + 2;

/// Transforms validated records into model input vectors.
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the fixed-order feature vector from a record.
    pub fn extract(&self, record: &TransactionRecord) -> Vec<f32> {
        let mut features = Vec::with_capacity(FEATURE_COUNT);

        features.push(record.amount() as f32);
        features.push(record.time() as f32);
        features.extend(record.components().iter().map(|&v| v as f32));

        features
    }

    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

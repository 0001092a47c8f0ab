//! Classifier interface and the ONNX Runtime backed implementation

use anyhow::{anyhow, Context, Result};
use ort::memory::Allocator;
use ort::session::Session;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Class probabilities exactly as a model reports them, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    /// Probabilities indexed by class id, e.g. `[normal, fraud]`
    Positional(Vec<f64>),
    /// Probabilities keyed by class name, e.g. `{"non_fraud": .., "fraud": ..}`
    Named(HashMap<String, f64>),
}

impl RawOutput {
    pub fn positional(values: &[f64]) -> Self {
        RawOutput::Positional(values.to_vec())
    }

    pub fn named<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        RawOutput::Named(
            pairs
                .into_iter()
                .map(|(name, p)| (name.to_string(), p))
                .collect(),
        )
    }
}

/// One trained binary classifier.
///
/// Implementations must be stateless per call: the registry shares a single
/// instance across every concurrent scoring request.
pub trait Classifier: Send + Sync {
    /// Class probabilities for one feature vector
    fn predict_proba(&self, features: &[f32]) -> Result<RawOutput>;

    /// Input width the model was trained on, when known
    fn expected_features(&self) -> Option<usize> {
        None
    }
}

/// Classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    name: String,
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    class_labels: Vec<String>,
    expected_features: Option<usize>,
}

impl OnnxClassifier {
    pub(crate) fn new(
        name: String,
        session: Session,
        input_name: String,
        output_name: String,
        class_labels: Vec<String>,
        expected_features: Option<usize>,
    ) -> Self {
        Self {
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
            class_labels,
            expected_features,
        }
    }

    /// Extract class probabilities from the session outputs.
    ///
    /// A probability tensor becomes a positional output; a `seq(map(int64, float))`
    /// (scikit-learn ZipMap) becomes a named output labelled by class id.
    fn extract_output(&self, outputs: &ort::session::SessionOutputs) -> Result<RawOutput> {
        if let Some(output) = outputs.get(self.output_name.as_str()) {
            if let Some(raw) = self.extract_value(output)? {
                return Ok(raw);
            }
        }

        // Fallback: first non-label output that yields probabilities
        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Some(raw) = self.extract_value(&output)? {
                debug!(model = %self.name, output = %name, "Extracted from fallback output");
                return Ok(raw);
            }
        }

        Err(anyhow!("no probability output found"))
    }

    fn extract_value(&self, output: &ort::value::DynValue) -> Result<Option<RawOutput>> {
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            let row = match dims.as_slice() {
                [1, n] | [n] => &data[..(*n as usize).min(data.len())],
                _ => return Err(anyhow!("unexpected probability tensor shape {:?}", dims)),
            };
            return Ok(Some(RawOutput::Positional(
                row.iter().map(|&p| p as f64).collect(),
            )));
        }

        let dtype = output.dtype();
        if DynSequenceValueType::can_downcast(&dtype) {
            return self.extract_from_sequence_map(output).map(Some);
        }

        Ok(None)
    }

    fn extract_from_sequence_map(&self, output: &ort::value::DynValue) -> Result<RawOutput> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow!("Failed to downcast to sequence: {}", e))?;
        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

        // Batch size is always 1
        let map_value = maps.first().ok_or_else(|| anyhow!("Empty sequence"))?;
        let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

        let mut named = HashMap::with_capacity(kv_pairs.len());
        for (class_id, prob) in kv_pairs {
            let label = usize::try_from(class_id)
                .ok()
                .and_then(|id| self.class_labels.get(id))
                .cloned()
                .unwrap_or_else(|| class_id.to_string());
            named.insert(label, prob as f64);
        }

        Ok(RawOutput::Named(named))
    }
}

impl Classifier for OnnxClassifier {
    fn predict_proba(&self, features: &[f32]) -> Result<RawOutput> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("Lock error: {}", e))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let raw = self.extract_output(&outputs)?;
        debug!(model = %self.name, output = ?raw, "Model output extracted");
        Ok(raw)
    }

    fn expected_features(&self) -> Option<usize> {
        self.expected_features
    }
}

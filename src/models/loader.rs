//! ONNX model loader

use crate::error::ModelLoadError;
use crate::models::inference::OnnxClassifier;
use crate::types::ModelKey;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::{Path, PathBuf};
use tracing::info;

/// Loader for the classifier artifacts
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
    /// Class names for class ids 0, 1 in map-shaped outputs
    class_labels: Vec<String>,
    expected_features: Option<usize>,
}

impl ModelLoader {
    /// Initialize ONNX Runtime and create a loader
    pub fn with_threads(onnx_threads: usize, class_labels: Vec<String>) -> Result<Self, ModelLoadError> {
        ort::init().commit().map_err(ModelLoadError::Runtime)?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self {
            onnx_threads,
            class_labels,
            expected_features: None,
        })
    }

    /// Reject feature vectors of the wrong width before they reach a session
    pub fn with_expected_features(mut self, count: usize) -> Self {
        self.expected_features = Some(count);
        self
    }

    /// Check that every artifact exists, before any runtime work is done.
    pub fn check_artifacts(artifacts: &[(ModelKey, PathBuf)]) -> Result<(), ModelLoadError> {
        for (key, path) in artifacts {
            if !path.is_file() {
                return Err(ModelLoadError::Missing {
                    key: *key,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }

    /// Load a single ONNX model from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P, key: ModelKey) -> Result<OnnxClassifier, ModelLoadError> {
        let path = path.as_ref();

        info!(model = %key, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session =
            build_session(path, self.onnx_threads).map_err(|source| ModelLoadError::Deserialize {
                key,
                path: path.to_path_buf(),
                source,
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            model = %key,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(OnnxClassifier::new(
            key.to_string(),
            session,
            input_name,
            output_name,
            self.class_labels.clone(),
            self.expected_features,
        ))
    }
}

fn build_session(path: &Path, onnx_threads: usize) -> ort::Result<Session> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(onnx_threads)?
        .commit_from_file(path)?;
    Ok(session)
}

//! Model registry: the fixed set of classifiers and their output adapters

use crate::config::ModelsConfig;
use crate::error::ModelLoadError;
use crate::feature_extractor::FEATURE_COUNT;
use crate::models::adapter::OutputAdapter;
use crate::models::inference::Classifier;
use crate::models::loader::ModelLoader;
use crate::types::ModelKey;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tracing::info;

static SHARED: OnceLock<ModelRegistry> = OnceLock::new();
static SHARED_INIT: Mutex<()> = Mutex::new(());

/// One classifier together with the adapter that normalizes its output
pub struct RegisteredModel {
    pub classifier: Box<dyn Classifier>,
    pub adapter: OutputAdapter,
}

/// Read-only set of all four classifiers.
///
/// Never mutated after construction, so a shared reference can be used by
/// any number of concurrent scoring calls.
pub struct ModelRegistry {
    models: BTreeMap<ModelKey, RegisteredModel>,
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    /// Load every ONNX artifact named by the configuration.
    ///
    /// All four artifacts are checked for existence before the runtime is
    /// initialized, so a missing file fails fast.
    pub fn load(config: &ModelsConfig) -> Result<Self, ModelLoadError> {
        let artifacts: Vec<(ModelKey, PathBuf)> = ModelKey::ALL
            .iter()
            .map(|&key| (key, config.artifact_path(key)))
            .collect();
        ModelLoader::check_artifacts(&artifacts)?;

        let loader = ModelLoader::with_threads(config.onnx_threads, config.class_labels.clone())?
            .with_expected_features(FEATURE_COUNT);

        let mut builder = Self::builder();
        for (key, path) in &artifacts {
            let classifier = loader.load_model(path, *key)?;
            builder = builder.register(*key, classifier, config.output_shape(*key).adapter());
        }
        let registry = builder.build()?;

        info!(
            count = registry.keys().count(),
            models_dir = %config.models_dir,
            "Model registry loaded"
        );
        Ok(registry)
    }

    /// Process-wide registry, loaded on first use.
    ///
    /// Concurrent first callers block on one initialization; later calls
    /// return the cached registry without locking. A failed load is not
    /// cached, so the next caller retries.
    pub fn shared(config: &ModelsConfig) -> Result<&'static ModelRegistry, ModelLoadError> {
        Self::shared_with(|| Self::load(config))
    }

    pub(crate) fn shared_with<F>(init: F) -> Result<&'static ModelRegistry, ModelLoadError>
    where
        F: FnOnce() -> Result<ModelRegistry, ModelLoadError>,
    {
        if let Some(registry) = SHARED.get() {
            return Ok(registry);
        }

        let _guard = SHARED_INIT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(registry) = SHARED.get() {
            return Ok(registry);
        }

        let registry = init()?;
        Ok(SHARED.get_or_init(|| registry))
    }

    pub fn get(&self, key: ModelKey) -> Option<&RegisteredModel> {
        self.models.get(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = ModelKey> + '_ {
        self.models.keys().copied()
    }
}

/// Assembles a registry; `build` insists on the complete model set.
#[derive(Default)]
pub struct ModelRegistryBuilder {
    models: BTreeMap<ModelKey, RegisteredModel>,
}

impl ModelRegistryBuilder {
    /// Register a classifier; a second registration for a key replaces the first.
    pub fn register<C>(mut self, key: ModelKey, classifier: C, adapter: OutputAdapter) -> Self
    where
        C: Classifier + 'static,
    {
        self.models.insert(
            key,
            RegisteredModel {
                classifier: Box::new(classifier),
                adapter,
            },
        );
        self
    }

    pub fn build(self) -> Result<ModelRegistry, ModelLoadError> {
        let missing: Vec<ModelKey> = ModelKey::ALL
            .iter()
            .copied()
            .filter(|key| !self.models.contains_key(key))
            .collect();

        if !missing.is_empty() {
            return Err(ModelLoadError::Incomplete(missing));
        }

        Ok(ModelRegistry {
            models: self.models,
        })
    }
}

//! Classifier registry, output adapters and consensus scoring

pub mod adapter;
pub mod aggregator;
pub mod inference;
pub mod loader;
pub mod registry;

pub use adapter::{OutputAdapter, OutputShape};
pub use aggregator::PredictionAggregator;
pub use inference::{Classifier, OnnxClassifier, RawOutput};
pub use loader::ModelLoader;
pub use registry::{ModelRegistry, ModelRegistryBuilder};
